//! Firebase ID token verification (RS256 with JWKS key rotation)
//!
//! Google publishes the signing keys for Firebase ID tokens as a JWKS document. Keys are
//! cached by `kid` and the set is fetched again when a token names a key we have not seen
//! or when the cached entry has expired.

use super::models::IdentityClaims;
use super::{map_jwt_error, IdentityVerifier};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use filedrive_core::{AppError, UserIdentity};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

const ISSUER_PREFIX: &str = "https://securetoken.google.com/";
const DEFAULT_CACHE_TTL_SECONDS: i64 = 3600;

/// JWKS (JSON Web Key Set) structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

/// JSON Web Key structure (RSA only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    #[serde(rename = "kty")]
    pub key_type: String,
    #[serde(rename = "kid")]
    pub key_id: Option<String>,
    #[serde(rename = "alg")]
    pub algorithm: Option<String>,
    #[serde(rename = "n")]
    pub modulus: Option<String>,
    #[serde(rename = "e")]
    pub exponent: Option<String>,
}

/// Cached public key with expiration
#[derive(Clone)]
struct CachedKey {
    key: DecodingKey,
    expires_at: DateTime<Utc>,
}

pub struct FirebaseVerifier {
    project_id: String,
    jwks_url: String,
    http: reqwest::Client,
    cache: Arc<RwLock<HashMap<String, CachedKey>>>,
    cache_ttl_seconds: i64,
}

impl FirebaseVerifier {
    /// Create a verifier for `project_id`, fetching keys from `jwks_url`.
    pub fn new(project_id: String, jwks_url: String, cache_ttl_seconds: Option<i64>) -> Self {
        Self {
            project_id,
            jwks_url,
            http: reqwest::Client::new(),
            cache: Arc::new(RwLock::new(HashMap::new())),
            cache_ttl_seconds: cache_ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECONDS),
        }
    }

    fn issuer(&self) -> String {
        format!("{}{}", ISSUER_PREFIX, self.project_id)
    }

    async fn fetch_jwks(&self) -> Result<Jwks, AppError> {
        let response = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AppError::Unauthorized(format!("Failed to fetch JWKS: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Unauthorized(format!(
                "JWKS endpoint returned error: {}",
                response.status()
            )));
        }

        response
            .json::<Jwks>()
            .await
            .map_err(|e| AppError::Unauthorized(format!("Failed to parse JWKS: {}", e)))
    }

    fn jwk_to_decoding_key(jwk: &Jwk) -> Result<DecodingKey, AppError> {
        if jwk.key_type != "RSA" {
            return Err(AppError::Unauthorized(format!(
                "Unsupported key type: {}",
                jwk.key_type
            )));
        }
        let n = jwk
            .modulus
            .as_ref()
            .ok_or_else(|| AppError::Unauthorized("RSA key missing modulus".to_string()))?;
        let e = jwk
            .exponent
            .as_ref()
            .ok_or_else(|| AppError::Unauthorized("RSA key missing exponent".to_string()))?;

        DecodingKey::from_rsa_components(n, e)
            .map_err(|e| AppError::Unauthorized(format!("Failed to create RSA key: {}", e)))
    }

    /// Replace the cache with every usable key in `jwks`.
    async fn store_keys(&self, jwks: &Jwks) {
        let expires_at = Utc::now() + chrono::Duration::seconds(self.cache_ttl_seconds);
        let mut cache = self.cache.write().await;
        cache.clear();
        for jwk in &jwks.keys {
            let Some(kid) = jwk.key_id.as_ref() else {
                continue;
            };
            match Self::jwk_to_decoding_key(jwk) {
                Ok(key) => {
                    cache.insert(kid.clone(), CachedKey { key, expires_at });
                }
                Err(e) => tracing::warn!(kid = %kid, error = %e, "Skipping unusable JWKS key"),
            }
        }
        tracing::debug!(keys = cache.len(), "Refreshed Firebase signing keys");
    }

    async fn cached_key(&self, kid: &str) -> Option<DecodingKey> {
        let cache = self.cache.read().await;
        cache
            .get(kid)
            .filter(|cached| cached.expires_at > Utc::now())
            .map(|cached| cached.key.clone())
    }

    async fn get_decoding_key(&self, kid: &str) -> Result<DecodingKey, AppError> {
        if let Some(key) = self.cached_key(kid).await {
            return Ok(key);
        }

        let jwks = self.fetch_jwks().await?;
        self.store_keys(&jwks).await;

        self.cached_key(kid)
            .await
            .ok_or_else(|| AppError::Unauthorized(format!("Key ID {} not found in JWKS", kid)))
    }

    #[cfg(test)]
    async fn seed_keys(&self, jwks: &Jwks) {
        self.store_keys(jwks).await;
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<UserIdentity, AppError> {
        let header = jsonwebtoken::decode_header(token)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token header: {}", e)))?;

        if header.alg != Algorithm::RS256 {
            return Err(AppError::Unauthorized(format!(
                "Unsupported algorithm: {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| AppError::Unauthorized("Token header has no key ID".to_string()))?;

        let decoding_key = self.get_decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_issuer(&[self.issuer()]);

        let data =
            decode::<IdentityClaims>(token, &decoding_key, &validation).map_err(map_jwt_error)?;
        data.claims.into_identity()
    }
}

//! HS256 tokens signed with a shared secret, for self-hosted deployments.

use super::models::IdentityClaims;
use super::{map_jwt_error, IdentityVerifier};
use async_trait::async_trait;
use filedrive_core::{AppError, UserIdentity};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

pub struct SharedSecretVerifier {
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
}

impl SharedSecretVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Sign a token for `identity` that expires after `ttl`.
    pub fn issue(
        &self,
        identity: &UserIdentity,
        ttl: chrono::Duration,
    ) -> Result<String, AppError> {
        let now = chrono::Utc::now();
        let claims = IdentityClaims {
            sub: identity.uid.clone(),
            exp: (now + ttl).timestamp(),
            iat: Some(now.timestamp()),
            email: Some(identity.email.clone()).filter(|s| !s.is_empty()),
            name: Some(identity.name.clone()).filter(|s| !s.is_empty()),
            picture: Some(identity.picture.clone()).filter(|s| !s.is_empty()),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }
}

#[async_trait]
impl IdentityVerifier for SharedSecretVerifier {
    async fn verify(&self, token: &str) -> Result<UserIdentity, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.leeway = 0;

        let data =
            decode::<IdentityClaims>(token, &self.decoding_key, &validation).map_err(map_jwt_error)?;
        data.claims.into_identity()
    }
}

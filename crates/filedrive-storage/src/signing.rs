//! HMAC-signed, expiring download URLs for backends without native presigning.
//!
//! Signature = hex(HMAC-SHA256(secret, "{key}\n{expires}")), where `expires` is a unix
//! timestamp in seconds.

use crate::{StorageError, StorageResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct UrlSigner {
    secret: Vec<u8>,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner").finish_non_exhaustive()
    }
}

impl UrlSigner {
    pub fn new(secret: impl Into<Vec<u8>>) -> StorageResult<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(StorageError::ConfigError(
                "URL signing secret cannot be empty".to_string(),
            ));
        }
        Ok(UrlSigner { secret })
    }

    fn mac(&self, storage_key: &str, expires: u64) -> StorageResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;
        mac.update(storage_key.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        Ok(mac)
    }

    /// Sign `storage_key` for access until `now + expires_in`.
    ///
    /// Returns `(expires, signature)` for the URL query string.
    pub fn sign(&self, storage_key: &str, expires_in: Duration) -> StorageResult<(u64, String)> {
        let expires = unix_now().saturating_add(expires_in.as_secs());
        let signature = hex::encode(self.mac(storage_key, expires)?.finalize().into_bytes());
        Ok((expires, signature))
    }

    /// Check a signature produced by [`UrlSigner::sign`] and that it has not expired.
    pub fn verify(&self, storage_key: &str, expires: u64, signature: &str) -> StorageResult<()> {
        let tag = hex::decode(signature)
            .map_err(|_| StorageError::AccessDenied("Invalid download signature".to_string()))?;
        self.mac(storage_key, expires)?
            .verify_slice(&tag)
            .map_err(|_| StorageError::AccessDenied("Invalid download signature".to_string()))?;

        if unix_now() > expires {
            return Err(StorageError::AccessDenied(
                "Download link has expired".to_string(),
            ));
        }
        Ok(())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_key_verifies() {
        let signer = UrlSigner::new("secret").unwrap();
        let (expires, sig) = signer.sign("u/f/a.txt", Duration::from_secs(60)).unwrap();
        assert!(signer.verify("u/f/a.txt", expires, &sig).is_ok());
    }

    #[test]
    fn signature_is_bound_to_key_and_expiry() {
        let signer = UrlSigner::new("secret").unwrap();
        let (expires, sig) = signer.sign("u/f/a.txt", Duration::from_secs(60)).unwrap();
        assert!(matches!(
            signer.verify("u/f/b.txt", expires, &sig),
            Err(StorageError::AccessDenied(_))
        ));
        assert!(signer.verify("u/f/a.txt", expires + 1, &sig).is_err());
        assert!(signer.verify("u/f/a.txt", expires, "not-hex").is_err());

        let other = UrlSigner::new("other").unwrap();
        assert!(other.verify("u/f/a.txt", expires, &sig).is_err());
    }

    #[test]
    fn expired_signature_rejected() {
        let signer = UrlSigner::new("secret").unwrap();
        let expires = unix_now() - 10;
        let sig = hex::encode(signer.mac("k", expires).unwrap().finalize().into_bytes());
        let err = signer.verify("k", expires, &sig).unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn empty_secret_rejected() {
        assert!(UrlSigner::new(Vec::new()).is_err());
    }
}

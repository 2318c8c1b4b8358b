//! Identity verification for bearer tokens.

pub mod firebase;
pub mod middleware;
pub mod models;
pub mod shared_secret;

use async_trait::async_trait;
use filedrive_core::{AppError, UserIdentity};

pub use firebase::FirebaseVerifier;
pub use models::UserContext;
pub use shared_secret::SharedSecretVerifier;

/// Verifies an identity token and returns who it belongs to.
///
/// Every failure is `AppError::Unauthorized`.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<UserIdentity, AppError>;
}

pub(crate) fn map_jwt_error(e: jsonwebtoken::errors::Error) -> AppError {
    tracing::debug!("JWT validation failed: {}", e);
    match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::Unauthorized("Token has expired".to_string())
        }
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => {
            AppError::Unauthorized("Invalid token issuer".to_string())
        }
        jsonwebtoken::errors::ErrorKind::InvalidAudience => {
            AppError::Unauthorized("Invalid token audience".to_string())
        }
        jsonwebtoken::errors::ErrorKind::ImmatureSignature => {
            AppError::Unauthorized("Token is not yet valid (nbf)".to_string())
        }
        _ => AppError::Unauthorized(format!("Invalid or expired token: {}", e)),
    }
}

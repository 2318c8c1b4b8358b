use crate::error::ErrorResponse;
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use axum::Json;
use filedrive_core::{AppError, UserIdentity};
use serde::{Deserialize, Serialize};

/// Claims carried by identity tokens. Firebase ID tokens and locally minted HS256
/// tokens share this shape.
#[derive(Debug, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub sub: String, // uid
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl IdentityClaims {
    /// Convert verified claims into an identity. Missing profile claims become empty strings.
    pub fn into_identity(self) -> Result<UserIdentity, AppError> {
        if self.sub.trim().is_empty() {
            return Err(AppError::Unauthorized(
                "Token has no subject".to_string(),
            ));
        }
        Ok(UserIdentity {
            uid: self.sub,
            email: self.email.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            picture: self.picture.unwrap_or_default(),
        })
    }
}

/// Verified caller, stored in request extensions by the auth middleware
#[derive(Debug, Clone)]
pub struct UserContext {
    pub identity: UserIdentity,
}

impl UserContext {
    pub fn user_id(&self) -> &str {
        &self.identity.uid
    }
}

impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<UserContext>().cloned().ok_or_else(|| {
            let err = AppError::Unauthorized("Missing user context".to_string());
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::from_app_error(&err, true)),
            )
        })
    }
}

use crate::auth::models::UserContext;
use crate::auth::IdentityVerifier;
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use filedrive_core::{AppError, UserIdentity};
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn IdentityVerifier>,
}

/// Verify an `Authorization` header value of the form `Bearer <token>`.
///
/// Shared by the HTTP middleware and the gateway adapter.
pub async fn authenticate(
    verifier: &dyn IdentityVerifier,
    auth_header: Option<&str>,
) -> Result<UserIdentity, AppError> {
    let auth_header = auth_header
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized("Invalid authorization header format".to_string())
        })?;

    verifier.verify(token).await
}

pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match authenticate(auth_state.verifier.as_ref(), auth_header).await {
        Ok(identity) => {
            tracing::debug!(user_id = %identity.uid, "Request authenticated");
            request.extensions_mut().insert(UserContext { identity });
            next.run(request).await
        }
        Err(err) => HttpAppError(err).into_response(),
    }
}

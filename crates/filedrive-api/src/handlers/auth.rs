use crate::auth::IdentityVerifier;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, Json};
use filedrive_core::{AppError, UserIdentity};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AuthRequest {
    pub token: Option<String>,
}

/// Verify a token and describe its owner. Shared with the gateway adapter.
pub(crate) async fn verify_token(
    verifier: &dyn IdentityVerifier,
    token: Option<&str>,
) -> Result<UserIdentity, AppError> {
    let token = token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("Token is required".to_string()))?;

    verifier.verify(token).await.map_err(|e| {
        tracing::debug!(error = %e, "Token verification failed");
        AppError::Unauthorized("Authentication failed".to_string())
    })
}

/// Exchange an identity token for the caller's profile
#[utoipa::path(
    post,
    path = "/auth",
    tag = "auth",
    request_body = AuthRequest,
    responses(
        (status = 200, description = "Token is valid", body = UserIdentity),
        (status = 400, description = "Token is required", body = ErrorResponse),
        (status = 401, description = "Authentication failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(operation = "authenticate"))]
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<AuthRequest>,
) -> Result<Json<UserIdentity>, HttpAppError> {
    let identity = verify_token(state.verifier.as_ref(), request.token.as_deref()).await?;
    tracing::info!(user_id = %identity.uid, "User authenticated");
    Ok(Json(identity))
}

//! API-gateway event adapter.
//!
//! Serves the same routes as the HTTP router for deployments behind an HTTP-API gateway,
//! where the request arrives as one JSON event and the body as text plus an
//! `isBase64Encoded` flag.

pub mod event;

pub use event::{GatewayEvent, GatewayResponse, HttpContext, RequestContext};

use crate::auth::middleware::authenticate;
use crate::error::{log_error, upload_app_error, ErrorResponse};
use crate::handlers::auth::verify_token;
use crate::handlers::files::DELETE_SUCCESS_MESSAGE;
use crate::state::AppState;
use filedrive_core::{AppError, ErrorMetadata};
use filedrive_processing::{decode, extract_from_text};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Headers attached to every gateway response.
const RESPONSE_HEADERS: [(&str, &str); 5] = [
    ("Content-Type", "application/json"),
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS"),
    (
        "Access-Control-Allow-Headers",
        "Content-Type, Authorization, X-Requested-With",
    ),
    ("Access-Control-Allow-Credentials", "true"),
];

#[derive(Serialize)]
struct NotFoundBody {
    error: &'static str,
    details: String,
}

#[derive(Deserialize)]
struct AuthBody {
    token: Option<String>,
}

fn response(status_code: u16, body: String) -> GatewayResponse {
    GatewayResponse {
        status_code,
        headers: RESPONSE_HEADERS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>(),
        body,
        is_base64_encoded: false,
    }
}

fn json_response<T: Serialize>(status_code: u16, body: &T) -> GatewayResponse {
    match serde_json::to_string(body) {
        Ok(body) => response(status_code, body),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response");
            response(500, r#"{"error":"Failed to serialize response"}"#.to_string())
        }
    }
}

fn error_response(state: &AppState, err: AppError) -> GatewayResponse {
    log_error(&err);
    let body = ErrorResponse::from_app_error(&err, state.config.is_production());
    json_response(err.http_status_code(), &body)
}

/// Route one gateway event and build its response. Never fails: errors become
/// structured error responses.
#[tracing::instrument(
    skip(state, event),
    fields(method = tracing::field::Empty, path = tracing::field::Empty)
)]
pub async fn dispatch(state: &AppState, mut event: GatewayEvent) -> GatewayResponse {
    event.headers = event
        .headers
        .drain()
        .map(|(name, value)| (name.to_ascii_lowercase(), value))
        .collect();

    let method = event.method();
    let path = event.path().to_string();
    tracing::Span::current()
        .record("method", method.as_str())
        .record("path", path.as_str());

    let result = match (method.as_str(), path.as_str()) {
        ("OPTIONS", _) => Ok(response(200, "{}".to_string())),
        ("POST", "/auth") => handle_auth(state, &event).await,
        ("POST", "/files") => handle_upload(state, &event).await,
        ("GET", "/files") => handle_list(state, &event).await,
        ("GET", p) if p.starts_with("/files/") => match event.file_id() {
            Some(file_id) => handle_get(state, &event, file_id).await,
            None => Ok(not_found(&method, &path)),
        },
        ("DELETE", p) if p.starts_with("/files/") => match event.file_id() {
            Some(file_id) => handle_delete(state, &event, file_id).await,
            None => Ok(not_found(&method, &path)),
        },
        _ => Ok(not_found(&method, &path)),
    };

    result.unwrap_or_else(|err| error_response(state, err))
}

fn not_found(method: &str, path: &str) -> GatewayResponse {
    tracing::debug!(method, path, "Unhandled gateway request");
    json_response(
        404,
        &NotFoundBody {
            error: "Not Found",
            details: format!("No route for {} {}", method, path),
        },
    )
}

async fn handle_auth(state: &AppState, event: &GatewayEvent) -> Result<GatewayResponse, AppError> {
    let raw = event.body.as_deref().unwrap_or_default();
    let body: AuthBody = if raw.trim().is_empty() {
        AuthBody { token: None }
    } else {
        let bytes = if event.is_base64_encoded {
            decode(raw, true).map_err(|e| upload_app_error(e.into()))?
        } else {
            bytes::Bytes::copy_from_slice(raw.as_bytes())
        };
        serde_json::from_slice(&bytes)
            .map_err(|e| AppError::InvalidInput(format!("Invalid request body: {}", e)))?
    };

    let identity = verify_token(state.verifier.as_ref(), body.token.as_deref()).await?;
    Ok(json_response(200, &identity))
}

async fn caller(state: &AppState, event: &GatewayEvent) -> Result<String, AppError> {
    let identity = authenticate(state.verifier.as_ref(), event.header("authorization")).await?;
    Ok(identity.uid)
}

async fn handle_upload(
    state: &AppState,
    event: &GatewayEvent,
) -> Result<GatewayResponse, AppError> {
    let user_id = caller(state, event).await?;
    let file = extract_from_text(
        event.body.as_deref().unwrap_or_default(),
        event.is_base64_encoded,
        event.header("content-type"),
    )
    .map_err(upload_app_error)?;
    let receipt = state.files.upload(&user_id, file).await?;
    Ok(json_response(200, &receipt))
}

async fn handle_list(state: &AppState, event: &GatewayEvent) -> Result<GatewayResponse, AppError> {
    let user_id = caller(state, event).await?;
    let files = state.files.list(&user_id).await?;
    Ok(json_response(200, &files))
}

async fn handle_get(
    state: &AppState,
    event: &GatewayEvent,
    file_id: &str,
) -> Result<GatewayResponse, AppError> {
    let user_id = caller(state, event).await?;
    let detail = state.files.get(&user_id, file_id).await?;
    Ok(json_response(200, &detail))
}

async fn handle_delete(
    state: &AppState,
    event: &GatewayEvent,
    file_id: &str,
) -> Result<GatewayResponse, AppError> {
    let user_id = caller(state, event).await?;
    state.files.delete(&user_id, file_id).await?;
    Ok(json_response(
        200,
        &serde_json::json!({ "message": DELETE_SUCCESS_MESSAGE }),
    ))
}

use crate::auth::UserContext;
use crate::error::{upload_app_error, ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::{header::CONTENT_TYPE, HeaderMap},
    Json,
};
use bytes::Bytes;
use filedrive_core::models::{ExtractedFile, FileDetail, FileSummary, UploadReceipt};
use filedrive_core::AppError;
use filedrive_processing::{extract_file, extract_from_text};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

pub const DELETE_SUCCESS_MESSAGE: &str = "File deleted successfully";

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Whether a body arrived base64-encoded (set by proxies that cannot pass binary through).
pub(crate) fn is_base64_transport(headers: &HeaderMap) -> bool {
    let header_is = |name: &str, expected: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().eq_ignore_ascii_case(expected))
            .unwrap_or(false)
    };
    header_is("x-body-encoding", "base64") || header_is("x-is-base64-encoded", "true")
}

/// Turn a raw HTTP body into the uploaded file (multipart or JSON).
pub(crate) fn extract_upload(headers: &HeaderMap, body: Bytes) -> Result<ExtractedFile, AppError> {
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());

    if is_base64_transport(headers) {
        let text = std::str::from_utf8(&body).map_err(|_| {
            AppError::InvalidInput("Invalid request body: base64 body is not text".to_string())
        })?;
        return extract_from_text(text, true, content_type).map_err(upload_app_error);
    }

    extract_file(body, content_type).map_err(upload_app_error)
}

/// Upload a file
///
/// Accepts `multipart/form-data` (first part with a filename) or a JSON body
/// `{fileContent, fileName, fileType?}` with base64 file content.
#[utoipa::path(
    post,
    path = "/files",
    tag = "files",
    request_body(content = String, description = "multipart/form-data or JSON upload body"),
    responses(
        (status = 200, description = "File uploaded successfully", body = UploadReceipt),
        (status = 400, description = "Malformed body or missing field", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Storage or metadata failure", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, headers, body),
    fields(user_id = %user.user_id(), body_bytes = body.len(), operation = "upload_file")
)]
pub async fn upload_file(
    user: UserContext,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UploadReceipt>, HttpAppError> {
    let file = extract_upload(&headers, body)?;
    let receipt = state.files.upload(user.user_id(), file).await?;
    Ok(Json(receipt))
}

/// List the caller's files, newest first
#[utoipa::path(
    get,
    path = "/files",
    tag = "files",
    responses(
        (status = 200, description = "Files owned by the caller", body = Vec<FileSummary>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id(), operation = "list_files"))]
pub async fn list_files(
    user: UserContext,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<FileSummary>>, HttpAppError> {
    Ok(Json(state.files.list(user.user_id()).await?))
}

/// Get file metadata with a time-limited download URL
#[utoipa::path(
    get,
    path = "/files/{fileId}",
    tag = "files",
    params(("fileId" = String, Path, description = "File ID")),
    responses(
        (status = 200, description = "File metadata and download URL", body = FileDetail),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state),
    fields(user_id = %user.user_id(), file_id = %file_id, operation = "get_file")
)]
pub async fn get_file(
    user: UserContext,
    Path(file_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<FileDetail>, HttpAppError> {
    Ok(Json(state.files.get(user.user_id(), &file_id).await?))
}

/// Delete a file and its metadata
#[utoipa::path(
    delete,
    path = "/files/{fileId}",
    tag = "files",
    params(("fileId" = String, Path, description = "File ID")),
    responses(
        (status = 200, description = "File deleted", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state),
    fields(user_id = %user.user_id(), file_id = %file_id, operation = "delete_file")
)]
pub async fn delete_file(
    user: UserContext,
    Path(file_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<MessageResponse>, HttpAppError> {
    state.files.delete(user.user_id(), &file_id).await?;
    Ok(Json(MessageResponse {
        message: DELETE_SUCCESS_MESSAGE.to_string(),
    }))
}

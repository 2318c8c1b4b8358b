//! Signed download route for the local storage backend.
//!
//! `LocalStorage` hands out `{base_url}/{key}?expires=..&signature=..` URLs; this route
//! checks the signature and streams the object back with its stored content type.

use crate::error::{storage_app_error, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
};
use filedrive_core::AppError;
use filedrive_storage::keys::file_name_from_key;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SignedDownloadQuery {
    pub expires: Option<u64>,
    pub signature: Option<String>,
}

#[tracing::instrument(skip(state, query), fields(key = %key, operation = "signed_download"))]
pub async fn download_signed(
    Path(key): Path<String>,
    Query(query): Query<SignedDownloadQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, HttpAppError> {
    let not_found = || AppError::NotFound("File not found".to_string());

    let signer = state.url_signer.as_ref().ok_or_else(not_found)?;
    let (Some(expires), Some(signature)) = (query.expires, query.signature.as_deref()) else {
        return Err(AppError::Forbidden("Invalid download signature".to_string()).into());
    };
    signer
        .verify(&key, expires, signature)
        .map_err(storage_app_error)?;

    // Keys are `{user_id}/{file_id}/{file_name}`; the record holds the content type and
    // disappears when the file expires.
    let mut segments = key.splitn(3, '/');
    let (user_id, file_id) = match (segments.next(), segments.next(), segments.next()) {
        (Some(user_id), Some(file_id), Some(_)) => (user_id, file_id),
        _ => return Err(not_found().into()),
    };
    let file_id = Uuid::parse_str(file_id).map_err(|_| not_found())?;
    let record = state
        .metadata()
        .get_item(user_id, file_id)
        .await?
        .filter(|record| record.file_key == key)
        .ok_or_else(not_found)?;

    let data = state.storage().download(&key).await.map_err(|e| {
        tracing::error!(error = %e, key = %key, "Failed to retrieve file from storage");
        storage_app_error(e)
    })?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        file_name_from_key(&key).replace('"', "")
    );
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, record.file_type.as_str())
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CACHE_CONTROL, "private, max-age=3600")
        .body(Body::from(data))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build response");
            HttpAppError::from(AppError::Internal(e.to_string()))
        })?;

    Ok(response)
}

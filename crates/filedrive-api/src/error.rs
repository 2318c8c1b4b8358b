//! Error rendering for the HTTP and gateway surfaces.
//!
//! Handlers return `Result<_, HttpAppError>`. Storage, parsing and validation errors are
//! mapped onto [`AppError`] here, so every failure leaves the service as the same JSON body.

use axum::{
    extract::rejection::JsonRejection,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use filedrive_core::{AppError, ErrorMetadata, LogLevel};
use filedrive_processing::{DecodeError, ParseError, UploadError, ValidationError};
use filedrive_storage::StorageError;
use serde::{de::DeserializeOwned, Serialize};
use utoipa::ToSchema;

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    /// Error chain; omitted in production and for downstream failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    pub code: String,
    /// True when the same request may succeed later
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

impl ErrorResponse {
    pub fn from_app_error(error: &AppError, is_production: bool) -> Self {
        let show_details = !is_production && !error.is_sensitive();
        Self {
            error: error.client_message(),
            details: show_details.then(|| error.detailed_message()),
            error_type: show_details.then(|| error.error_type().to_string()),
            code: error.error_code().to_string(),
            recoverable: error.is_recoverable(),
            suggested_action: error.suggested_action().map(String::from),
        }
    }
}

/// [`AppError`] as an axum response.
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl HttpAppError {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        log_error(&self.0);
        let body = ErrorResponse::from_app_error(&self.0, is_production_env());
        (self.status(), Json(body)).into_response()
    }
}

/// `Json<T>` whose rejection is a 400 in the service's error format.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidatedJson(value)),
            Err(rejection) => Err(rejection.into()),
        }
    }
}

pub(crate) fn log_error(error: &AppError) {
    let kind = error.error_type();
    match error.log_level() {
        LogLevel::Debug => tracing::debug!(error = %error, kind, "Request failed"),
        LogLevel::Error => tracing::error!(error = %error, kind, "Request failed"),
    }
}

pub(crate) fn is_production_env() -> bool {
    ["ENVIRONMENT", "APP_ENV"]
        .iter()
        .find_map(|name| std::env::var(name).ok())
        .is_some_and(|env| matches!(env.to_lowercase().as_str(), "production" | "prod"))
}

pub(crate) fn storage_app_error(err: StorageError) -> AppError {
    match err {
        StorageError::NotFound(_) => AppError::NotFound("File not found".to_string()),
        StorageError::AccessDenied(msg) => AppError::Forbidden(msg),
        StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
        StorageError::ConfigError(msg) => AppError::Internal(msg),
        StorageError::IoError(err) => AppError::Storage(err.to_string()),
        StorageError::UploadFailed(msg)
        | StorageError::DownloadFailed(msg)
        | StorageError::DeleteFailed(msg)
        | StorageError::BackendError(msg) => AppError::Storage(msg),
    }
}

pub(crate) fn validation_app_error(err: ValidationError) -> AppError {
    match err {
        ValidationError::FileTooLarge { size, max } => AppError::PayloadTooLarge(format!(
            "File is {} bytes; the limit is {} bytes",
            size, max
        )),
        other => AppError::InvalidInput(other.to_string()),
    }
}

pub(crate) fn upload_app_error(err: UploadError) -> AppError {
    AppError::InvalidInput(err.to_string())
}

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(err.into())
    }
}

impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        HttpAppError(AppError::InvalidInput(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        HttpAppError(storage_app_error(err))
    }
}

impl From<ValidationError> for HttpAppError {
    fn from(err: ValidationError) -> Self {
        HttpAppError(validation_app_error(err))
    }
}

impl From<UploadError> for HttpAppError {
    fn from(err: UploadError) -> Self {
        HttpAppError(upload_app_error(err))
    }
}

impl From<ParseError> for HttpAppError {
    fn from(err: ParseError) -> Self {
        UploadError::from(err).into()
    }
}

impl From<DecodeError> for HttpAppError {
    fn from(err: DecodeError) -> Self {
        UploadError::from(err).into()
    }
}

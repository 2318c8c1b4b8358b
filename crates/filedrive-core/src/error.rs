//! Error types module
//!
//! Every failure a request can end in is an [`AppError`]. Library crates keep their own
//! narrow error enums (storage, parsing, validation) and the API layer converts them.
//!
//! Errors split into two classes. Client errors carry a message meant for the caller and
//! are logged at debug level. Downstream failures (metadata store, object storage,
//! internal) answer 500 with a generic message, hide their details in production and
//! are logged as errors.

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected failures caused by the request
    Debug,
    /// Failures of a dependency or of the service itself
    Error,
}

/// How an error is presented to the client and the logs.
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "STORAGE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether retrying the same request may succeed
    fn is_recoverable(&self) -> bool;

    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Metadata store error: {0}")]
    Metadata(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

/// Presentation of one error variant.
struct Class {
    status: u16,
    code: &'static str,
    client_error: bool,
    action: &'static str,
}

const fn client(status: u16, code: &'static str, action: &'static str) -> Class {
    Class {
        status,
        code,
        client_error: true,
        action,
    }
}

const fn downstream(code: &'static str) -> Class {
    Class {
        status: 500,
        code,
        client_error: false,
        action: "Retry after a short delay",
    }
}

impl AppError {
    fn class(&self) -> Class {
        match self {
            AppError::Database(_) => downstream("DATABASE_ERROR"),
            AppError::Metadata(_) => downstream("METADATA_ERROR"),
            AppError::Storage(_) => downstream("STORAGE_ERROR"),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                downstream("INTERNAL_ERROR")
            }
            AppError::InvalidInput(_) => client(
                400,
                "INVALID_INPUT",
                "Check request parameters and try again",
            ),
            AppError::BadRequest(_) => {
                client(400, "BAD_REQUEST", "Check request format and parameters")
            }
            AppError::NotFound(_) => client(404, "NOT_FOUND", "Verify the file ID exists"),
            AppError::PayloadTooLarge(_) => client(413, "PAYLOAD_TOO_LARGE", "Reduce file size"),
            AppError::Unauthorized(_) => client(
                401,
                "UNAUTHORIZED",
                "Sign in again to obtain a fresh ID token",
            ),
            AppError::Forbidden(_) => client(403, "FORBIDDEN", "Request a new download link"),
        }
    }

    /// Variant name, reported alongside details outside production.
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Database(_) => "Database",
            AppError::Metadata(_) => "Metadata",
            AppError::Storage(_) => "Storage",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::BadRequest(_) => "BadRequest",
            AppError::NotFound(_) => "NotFound",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Forbidden(_) => "Forbidden",
        }
    }

    /// The error and up to five of its causes, one per line.
    pub fn detailed_message(&self) -> String {
        const MAX_CAUSES: usize = 5;

        let mut details = self.to_string();
        let causes: Vec<String> = std::iter::successors(std::error::Error::source(self), |e| {
            e.source()
        })
        .map(|e| e.to_string())
        .take(MAX_CAUSES + 1)
        .collect();

        for (i, cause) in causes.iter().enumerate() {
            if i == MAX_CAUSES {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str("\n  Caused by: ");
            details.push_str(cause);
        }
        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        self.class().status
    }

    fn error_code(&self) -> &'static str {
        self.class().code
    }

    fn is_recoverable(&self) -> bool {
        !self.class().client_error
    }

    fn suggested_action(&self) -> Option<&'static str> {
        Some(self.class().action)
    }

    fn is_sensitive(&self) -> bool {
        !self.class().client_error
    }

    fn log_level(&self) -> LogLevel {
        if self.class().client_error {
            LogLevel::Debug
        } else {
            LogLevel::Error
        }
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Metadata(_) => "Failed to access file metadata".to_string(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
            AppError::InvalidInput(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg) => msg.clone(),
        }
    }
}

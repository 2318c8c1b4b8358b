//! The object store seam shared by every backend.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// A signed download link was rejected.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Byte storage addressed by `{user_id}/{file_id}/{file_name}` keys (see [`crate::keys`]).
///
/// Implemented for S3, the local filesystem and process memory; the file service only
/// ever sees `Arc<dyn Storage>`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` under `storage_key`. An existing object is overwritten, which keeps
    /// retried uploads harmless.
    async fn upload(&self, storage_key: &str, data: Bytes, content_type: &str)
        -> StorageResult<()>;

    async fn download(&self, storage_key: &str) -> StorageResult<Bytes>;

    /// Remove an object. Removing a key that holds nothing is not an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// A time-limited GET link that serves the object without a bearer token.
    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    fn backend_type(&self) -> StorageBackend;
}

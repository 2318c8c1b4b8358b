//! File service: the upload, list, get and delete workflows.
//!
//! Uploads write the object first and the metadata record second, so a listed file always
//! has content behind it. The metadata write is retried with backoff; when it still fails
//! the object is deleted again and the upload reports an error.

use crate::error::{storage_app_error, validation_app_error};
use chrono::Utc;
use filedrive_core::models::{ExtractedFile, FileDetail, FileRecord, FileSummary, UploadReceipt};
use filedrive_core::{AppError, Config};
use filedrive_db::FileMetadataStore;
use filedrive_processing::UploadValidator;
use filedrive_storage::{generate_storage_key, Storage};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

const UPLOAD_SUCCESS_MESSAGE: &str = "File uploaded successfully";
const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(100);

#[derive(Clone)]
pub struct FileService {
    storage: Arc<dyn Storage>,
    metadata: Arc<dyn FileMetadataStore>,
    validator: UploadValidator,
    file_ttl: Option<chrono::Duration>,
    presigned_url_ttl: Duration,
    metadata_write_max_attempts: u32,
    retry_base_delay: Duration,
}

impl FileService {
    pub fn new(
        storage: Arc<dyn Storage>,
        metadata: Arc<dyn FileMetadataStore>,
        config: &Config,
    ) -> Self {
        Self {
            storage,
            metadata,
            validator: UploadValidator::new(config.max_file_size_bytes()),
            file_ttl: config.file_ttl(),
            presigned_url_ttl: config.presigned_url_ttl(),
            metadata_write_max_attempts: config.metadata_write_max_attempts.max(1),
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
        }
    }

    /// Override the first retry delay (doubles on every further attempt).
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn metadata(&self) -> &Arc<dyn FileMetadataStore> {
        &self.metadata
    }

    #[tracing::instrument(
        skip(self, file),
        fields(user_id = %user_id, file_name = %file.file_name, size_bytes = file.size())
    )]
    pub async fn upload(
        &self,
        user_id: &str,
        file: ExtractedFile,
    ) -> Result<UploadReceipt, AppError> {
        let file = self.validator.validate(file).map_err(validation_app_error)?;

        let file_id = Uuid::new_v4();
        let storage_key = generate_storage_key(user_id, &file_id.to_string(), &file.file_name)
            .map_err(storage_app_error)?;
        let size = file.size();
        let upload_date = Utc::now();

        let start = Instant::now();
        self.storage
            .upload(&storage_key, file.content, &file.content_type)
            .await
            .map_err(storage_app_error)?;

        let record = FileRecord {
            file_id,
            user_id: user_id.to_string(),
            file_name: file.file_name,
            file_key: storage_key,
            file_type: file.content_type,
            file_size: size as i64,
            upload_date,
            expires_at: self.file_ttl.map(|ttl| upload_date + ttl),
        };

        if let Err(e) = self.put_record_with_retry(&record).await {
            self.compensate_orphaned_object(&record.file_key).await;
            return Err(e);
        }

        tracing::info!(
            file_id = %file_id,
            key = %record.file_key,
            duration_ms = start.elapsed().as_millis() as u64,
            "File uploaded"
        );

        Ok(UploadReceipt {
            message: UPLOAD_SUCCESS_MESSAGE.to_string(),
            file_id,
            file_name: record.file_name,
            size: size as u64,
            content_type: record.file_type,
        })
    }

    async fn put_record_with_retry(&self, record: &FileRecord) -> Result<(), AppError> {
        let mut delay = self.retry_base_delay;
        let mut attempt = 1;
        loop {
            match self.metadata.put_item(record).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.metadata_write_max_attempts => {
                    tracing::warn!(
                        error = %e,
                        file_id = %record.file_id,
                        attempt,
                        "Metadata write failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        file_id = %record.file_id,
                        attempts = attempt,
                        "Metadata write failed"
                    );
                    return Err(match e {
                        e @ (AppError::Metadata(_) | AppError::Database(_)) => e,
                        other => AppError::Metadata(other.to_string()),
                    });
                }
            }
        }
    }

    async fn compensate_orphaned_object(&self, storage_key: &str) {
        match self.storage.delete(storage_key).await {
            Ok(()) => {
                tracing::info!(key = %storage_key, "Removed object after metadata write failure")
            }
            Err(e) => tracing::warn!(
                error = %e,
                key = %storage_key,
                "Failed to cleanup storage file after metadata error"
            ),
        }
    }

    #[tracing::instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list(&self, user_id: &str) -> Result<Vec<FileSummary>, AppError> {
        let records = self.metadata.query_by_user(user_id).await?;
        tracing::debug!(count = records.len(), "Listed files");
        Ok(records.into_iter().map(FileSummary::from).collect())
    }

    #[tracing::instrument(skip(self), fields(user_id = %user_id, file_id = %file_id))]
    pub async fn get(&self, user_id: &str, file_id: &str) -> Result<FileDetail, AppError> {
        let record = self.find(user_id, file_id).await?;
        let download_url = self
            .storage
            .get_presigned_url(&record.file_key, self.presigned_url_ttl)
            .await
            .map_err(storage_app_error)?;
        Ok(FileDetail {
            file: record,
            download_url,
        })
    }

    /// Delete the object, then the record. A missing object is not an error.
    #[tracing::instrument(skip(self), fields(user_id = %user_id, file_id = %file_id))]
    pub async fn delete(&self, user_id: &str, file_id: &str) -> Result<(), AppError> {
        let record = self.find(user_id, file_id).await?;
        self.storage
            .delete(&record.file_key)
            .await
            .map_err(storage_app_error)?;
        self.metadata.delete_item(user_id, record.file_id).await?;
        tracing::info!(key = %record.file_key, "File deleted");
        Ok(())
    }

    async fn find(&self, user_id: &str, file_id: &str) -> Result<FileRecord, AppError> {
        let not_found = || AppError::NotFound("File not found".to_string());
        // An id that is not a UUID cannot name a stored file.
        let file_id = Uuid::parse_str(file_id).map_err(|_| not_found())?;
        self.metadata
            .get_item(user_id, file_id)
            .await?
            .ok_or_else(not_found)
    }
}

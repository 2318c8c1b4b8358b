//! Process-local metadata store for development and tests.

use super::files::FileMetadataStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use filedrive_core::models::FileRecord;
use filedrive_core::AppError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

type RecordKey = (String, Uuid);

/// Records held in a shared map. Clones share the same contents.
#[derive(Clone, Default)]
pub struct InMemoryFileMetadataStore {
    records: Arc<RwLock<HashMap<RecordKey, FileRecord>>>,
    failing_puts: Arc<AtomicU32>,
}

impl InMemoryFileMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` calls to `put_item` fail.
    pub fn fail_next_puts(&self, count: u32) {
        self.failing_puts.store(count, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_poisoned() -> AppError {
        AppError::Metadata("in-memory metadata lock poisoned".to_string())
    }

    fn take_failure(&self) -> bool {
        self.failing_puts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl FileMetadataStore for InMemoryFileMetadataStore {
    async fn put_item(&self, record: &FileRecord) -> Result<(), AppError> {
        if self.take_failure() {
            return Err(AppError::Metadata(format!(
                "simulated write failure for {}",
                record.file_id
            )));
        }
        let mut records = self.records.write().map_err(|_| Self::lock_poisoned())?;
        records.insert((record.user_id.clone(), record.file_id), record.clone());
        Ok(())
    }

    async fn get_item(
        &self,
        user_id: &str,
        file_id: Uuid,
    ) -> Result<Option<FileRecord>, AppError> {
        let now = Utc::now();
        let records = self.records.read().map_err(|_| Self::lock_poisoned())?;
        Ok(records
            .get(&(user_id.to_string(), file_id))
            .filter(|record| !record.is_expired_at(now))
            .cloned())
    }

    async fn query_by_user(&self, user_id: &str) -> Result<Vec<FileRecord>, AppError> {
        let now = Utc::now();
        let records = self.records.read().map_err(|_| Self::lock_poisoned())?;
        let mut found: Vec<FileRecord> = records
            .values()
            .filter(|record| record.user_id == user_id && !record.is_expired_at(now))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.upload_date
                .cmp(&a.upload_date)
                .then_with(|| a.file_id.cmp(&b.file_id))
        });
        Ok(found)
    }

    async fn delete_item(&self, user_id: &str, file_id: Uuid) -> Result<bool, AppError> {
        let mut records = self.records.write().map_err(|_| Self::lock_poisoned())?;
        Ok(records.remove(&(user_id.to_string(), file_id)).is_some())
    }

    async fn scan_expired(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<FileRecord>, AppError> {
        let records = self.records.read().map_err(|_| Self::lock_poisoned())?;
        let mut expired: Vec<FileRecord> = records
            .values()
            .filter(|record| record.is_expired_at(now))
            .cloned()
            .collect();
        expired.sort_by_key(|record| record.expires_at);
        expired.truncate(limit.max(0) as usize);
        Ok(expired)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

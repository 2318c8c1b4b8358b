use chrono::Utc;
use filedrive_db::FileMetadataStore;
use filedrive_storage::Storage;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use uuid::Uuid;

/// Records removed per sweep batch.
const SWEEP_BATCH_SIZE: i64 = 100;

/// Removes files whose `expires_at` has passed: the object first, then its record.
#[derive(Clone)]
pub struct CleanupService {
    metadata: Arc<dyn FileMetadataStore>,
    storage: Arc<dyn Storage>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub expired: usize,
    pub objects_deleted: usize,
    pub records_deleted: usize,
}

impl CleanupService {
    pub fn new(metadata: Arc<dyn FileMetadataStore>, storage: Arc<dyn Storage>) -> Self {
        Self { metadata, storage }
    }

    /// Start the background sweep. Returns a JoinHandle for graceful shutdown.
    pub fn start(self: Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut cleanup_interval = interval(every);

            loop {
                cleanup_interval.tick().await;

                match self.cleanup_expired_files().await {
                    Ok(report) if report.expired > 0 => tracing::info!(
                        expired = report.expired,
                        objects_deleted = report.objects_deleted,
                        records_deleted = report.records_deleted,
                        "Cleanup completed"
                    ),
                    Ok(_) => tracing::debug!("Cleanup found no expired files"),
                    Err(e) => tracing::error!(error = %e, "Cleanup task failed"),
                }
            }
        })
    }

    /// Sweep every expired file. Per-file failures are logged and skipped; a skipped file
    /// stays for the next sweep and does not block the files behind it.
    #[tracing::instrument(skip(self), fields(cleanup.operation = "expire_files"))]
    pub async fn cleanup_expired_files(&self) -> Result<SweepReport, anyhow::Error> {
        let mut report = SweepReport::default();
        let mut skipped: HashSet<Uuid> = HashSet::new();

        loop {
            // Skipped records come back at the head of every scan, so widen past them.
            let limit = SWEEP_BATCH_SIZE + skipped.len() as i64;
            let batch = self.metadata.scan_expired(Utc::now(), limit).await?;
            let exhausted = (batch.len() as i64) < limit;
            let fresh: Vec<_> = batch
                .into_iter()
                .filter(|record| !skipped.contains(&record.file_id))
                .collect();
            if fresh.is_empty() {
                break;
            }

            for record in fresh {
                report.expired += 1;
                tracing::info!(
                    file_id = %record.file_id,
                    key = %record.file_key,
                    expires_at = ?record.expires_at,
                    "Deleting expired file"
                );

                if let Err(e) = self.storage.delete(&record.file_key).await {
                    // Keep the record so the next sweep retries the object.
                    tracing::error!(
                        error = %e,
                        key = %record.file_key,
                        "Failed to delete expired object from storage"
                    );
                    skipped.insert(record.file_id);
                    continue;
                }
                report.objects_deleted += 1;

                match self
                    .metadata
                    .delete_item(&record.user_id, record.file_id)
                    .await
                {
                    Ok(_) => report.records_deleted += 1,
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            file_id = %record.file_id,
                            "Failed to delete expired record"
                        );
                        skipped.insert(record.file_id);
                    }
                }
            }

            if exhausted {
                break;
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use filedrive_core::models::FileRecord;
    use filedrive_db::InMemoryFileMetadataStore;
    use filedrive_storage::InMemoryStorage;

    async fn stored(
        metadata: &InMemoryFileMetadataStore,
        storage: &InMemoryStorage,
        expires_in_secs: Option<i64>,
    ) -> FileRecord {
        stored_for(metadata, storage, "alice", expires_in_secs).await
    }

    async fn stored_for(
        metadata: &InMemoryFileMetadataStore,
        storage: &InMemoryStorage,
        user_id: &str,
        expires_in_secs: Option<i64>,
    ) -> FileRecord {
        let file_id = Uuid::new_v4();
        let record = FileRecord {
            file_id,
            user_id: user_id.to_string(),
            file_name: "a.txt".to_string(),
            file_key: format!("{}/{}/a.txt", user_id, file_id),
            file_type: "text/plain".to_string(),
            file_size: 1,
            upload_date: Utc::now(),
            expires_at: expires_in_secs.map(|s| Utc::now() + chrono::Duration::seconds(s)),
        };
        storage
            .upload(&record.file_key, Bytes::from_static(b"x"), "text/plain")
            .await
            .unwrap();
        metadata.put_item(&record).await.unwrap();
        record
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_files() {
        let metadata = InMemoryFileMetadataStore::new();
        let storage = InMemoryStorage::new();
        let expired = stored(&metadata, &storage, Some(-60)).await;
        let live = stored(&metadata, &storage, Some(3600)).await;
        let permanent = stored(&metadata, &storage, None).await;

        let service = CleanupService::new(Arc::new(metadata.clone()), Arc::new(storage.clone()));
        let report = service.cleanup_expired_files().await.unwrap();

        assert_eq!(
            report,
            SweepReport {
                expired: 1,
                objects_deleted: 1,
                records_deleted: 1
            }
        );
        assert!(storage.object(&expired.file_key).is_none());
        assert!(storage.object(&live.file_key).is_some());
        assert!(storage.object(&permanent.file_key).is_some());
        assert_eq!(metadata.len(), 2);
    }

    #[tokio::test]
    async fn storage_failure_keeps_record_for_next_sweep() {
        let metadata = InMemoryFileMetadataStore::new();
        let storage = InMemoryStorage::new();
        stored(&metadata, &storage, Some(-60)).await;
        storage.set_fail_deletes(true);

        let service = CleanupService::new(Arc::new(metadata.clone()), Arc::new(storage.clone()));
        let report = service.cleanup_expired_files().await.unwrap();
        assert_eq!(report.objects_deleted, 0);
        assert_eq!(metadata.len(), 1);

        storage.set_fail_deletes(false);
        let report = service.cleanup_expired_files().await.unwrap();
        assert_eq!(report.records_deleted, 1);
        assert!(metadata.is_empty());
    }

    #[tokio::test]
    async fn stuck_batch_does_not_block_later_expired_files() {
        let metadata = InMemoryFileMetadataStore::new();
        let storage = InMemoryStorage::new();
        for _ in 0..=SWEEP_BATCH_SIZE {
            stored_for(&metadata, &storage, "bob", Some(-600)).await;
        }
        let later = stored(&metadata, &storage, Some(-60)).await;
        storage.fail_deletes_under("bob/");

        let service = CleanupService::new(Arc::new(metadata.clone()), Arc::new(storage.clone()));
        let report = service.cleanup_expired_files().await.unwrap();

        assert_eq!(
            report,
            SweepReport {
                expired: SWEEP_BATCH_SIZE as usize + 2,
                objects_deleted: 1,
                records_deleted: 1
            }
        );
        assert!(storage.object(&later.file_key).is_none());
        assert!(metadata.get_item("alice", later.file_id).await.unwrap().is_none());
        assert_eq!(metadata.len(), SWEEP_BATCH_SIZE as usize + 1);
    }

    #[tokio::test]
    async fn failed_files_are_counted_once_per_sweep() {
        let metadata = InMemoryFileMetadataStore::new();
        let storage = InMemoryStorage::new();
        for _ in 0..3 {
            stored(&metadata, &storage, Some(-60)).await;
        }
        storage.set_fail_deletes(true);

        let service = CleanupService::new(Arc::new(metadata.clone()), Arc::new(storage.clone()));
        let report = service.cleanup_expired_files().await.unwrap();

        assert_eq!(
            report,
            SweepReport {
                expired: 3,
                objects_deleted: 0,
                records_deleted: 0
            }
        );
        assert_eq!(metadata.len(), 3);
    }
}

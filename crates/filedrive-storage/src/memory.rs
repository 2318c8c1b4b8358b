//! In-process object store for development and tests.

use crate::keys::validate_key;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

/// Objects held in a shared map. Clones share the same contents.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
    fail_uploads: Arc<AtomicBool>,
    fail_deletes: Arc<RwLock<Option<String>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent uploads fail with `UploadFailed`.
    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent deletes fail with `DeleteFailed`.
    pub fn set_fail_deletes(&self, fail: bool) {
        self.set_delete_failure(fail.then(String::new));
    }

    /// Make deletes of keys starting with `prefix` fail; other keys delete normally.
    pub fn fail_deletes_under(&self, prefix: &str) {
        self.set_delete_failure(Some(prefix.to_string()));
    }

    fn set_delete_failure(&self, prefix: Option<String>) {
        if let Ok(mut failing) = self.fail_deletes.write() {
            *failing = prefix;
        }
    }

    fn delete_fails_for(&self, storage_key: &str) -> bool {
        self.fail_deletes
            .read()
            .ok()
            .and_then(|failing| {
                failing
                    .as_deref()
                    .map(|prefix| storage_key.starts_with(prefix))
            })
            .unwrap_or(false)
    }

    pub fn object(&self, storage_key: &str) -> Option<StoredObject> {
        self.objects
            .read()
            .ok()
            .and_then(|objects| objects.get(storage_key).cloned())
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|objects| objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_poisoned() -> StorageError {
        StorageError::BackendError("in-memory storage lock poisoned".to_string())
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn upload(
        &self,
        storage_key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<()> {
        validate_key(storage_key)?;
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed(format!(
                "simulated failure for {}",
                storage_key
            )));
        }
        let mut objects = self.objects.write().map_err(|_| Self::lock_poisoned())?;
        objects.insert(
            storage_key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Bytes> {
        validate_key(storage_key)?;
        let objects = self.objects.read().map_err(|_| Self::lock_poisoned())?;
        objects
            .get(storage_key)
            .map(|object| object.data.clone())
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        validate_key(storage_key)?;
        if self.delete_fails_for(storage_key) {
            return Err(StorageError::DeleteFailed(format!(
                "simulated failure for {}",
                storage_key
            )));
        }
        let mut objects = self.objects.write().map_err(|_| Self::lock_poisoned())?;
        objects.remove(storage_key);
        Ok(())
    }

    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        validate_key(storage_key)?;
        Ok(format!(
            "memory://{}?expires_in={}",
            storage_key,
            expires_in.as_secs()
        ))
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        validate_key(storage_key)?;
        let objects = self.objects.read().map_err(|_| Self::lock_poisoned())?;
        Ok(objects.contains_key(storage_key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

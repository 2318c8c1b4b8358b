use crate::keys::validate_key;
use crate::signing::UrlSigner;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Objects as plain files under a root directory, one directory level per key segment.
///
/// Presigned URLs point at `{base_url}/{key}` with an HMAC signature and expiry in the
/// query string; the API's storage route checks them with the same [`UrlSigner`].
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    signer: UrlSigner,
}

impl LocalStorage {
    /// Open (creating if needed) the storage root at `base_path`. `base_url` is where the
    /// signed download route is served, e.g. `http://localhost:4000/storage`.
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        signer: UrlSigner,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path)
            .await
            .map_err(|e| io_failure(StorageError::ConfigError, "create", &base_path, e))?;

        Ok(LocalStorage {
            base_path,
            base_url,
            signer,
        })
    }

    pub fn signer(&self) -> &UrlSigner {
        &self.signer
    }

    /// Resolve a key under the storage root. Keys that escape the root are rejected.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        validate_key(storage_key)?;
        let path = self.base_path.join(storage_key);

        // Symlinks inside the root could still point elsewhere.
        if let Ok(resolved) = path.canonicalize() {
            let root = self.base_path.canonicalize().map_err(|e| {
                StorageError::ConfigError(format!("Storage root is not accessible: {}", e))
            })?;
            if !resolved.starts_with(&root) {
                return Err(StorageError::InvalidKey(format!(
                    "{} resolves outside the storage root",
                    storage_key
                )));
            }
        }
        Ok(path)
    }

    /// `{base_url}/{key}` with every key segment percent-encoded.
    fn object_url(&self, storage_key: &str) -> String {
        let segments: Vec<_> = storage_key
            .split('/')
            .map(urlencoding::encode)
            .collect();
        format!("{}/{}", self.base_url.trim_end_matches('/'), segments.join("/"))
    }

    /// Remove the empty `{file_id}` and `{user_id}` directories a delete leaves behind.
    async fn prune_empty_parents(&self, path: &Path) {
        for dir in path.ancestors().skip(1) {
            if dir == self.base_path || fs::remove_dir(dir).await.is_err() {
                break;
            }
        }
    }
}

fn io_failure(
    wrap: fn(String) -> StorageError,
    action: &str,
    path: &Path,
    err: std::io::Error,
) -> StorageError {
    wrap(format!("Failed to {} {}: {}", action, path.display(), err))
}

#[async_trait]
impl Storage for LocalStorage {
    /// Writes to a temp file in the target directory and renames it into place, so readers
    /// never see a partial object and a retried upload simply replaces the first.
    async fn upload(
        &self,
        storage_key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;
        let parent = path.parent().unwrap_or(&self.base_path);
        fs::create_dir_all(parent)
            .await
            .map_err(|e| io_failure(StorageError::UploadFailed, "create", parent, e))?;

        // Fixed-length name so a maximum-length object name still fits.
        let staging = parent.join(format!(".upload-{}.partial", Uuid::new_v4().simple()));
        let write = async {
            let mut file = fs::File::create(&staging).await?;
            file.write_all(&data).await?;
            file.sync_all().await?;
            fs::rename(&staging, &path).await?;
            Ok::<_, std::io::Error>(())
        };
        if let Err(e) = write.await {
            let _ = fs::remove_file(&staging).await;
            return Err(io_failure(StorageError::UploadFailed, "write", &path, e));
        }

        tracing::info!(
            key = %storage_key,
            content_type = %content_type,
            size_bytes = data.len(),
            "Object written to local storage"
        );
        Ok(())
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Bytes> {
        let path = self.key_to_path(storage_key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => Err(io_failure(StorageError::DownloadFailed, "read", &path, e)),
        }
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                self.prune_empty_parents(&path).await;
                tracing::debug!(key = %storage_key, "Object removed from local storage");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_failure(StorageError::DeleteFailed, "delete", &path, e)),
        }
    }

    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.key_to_path(storage_key)?;
        let (expires, signature) = self.signer.sign(storage_key, expires_in)?;
        Ok(format!(
            "{}?expires={}&signature={}",
            self.object_url(storage_key),
            expires,
            signature
        ))
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        Ok(fs::try_exists(&path).await?)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn storage(dir: &Path) -> LocalStorage {
        LocalStorage::new(
            dir,
            "http://localhost:4000/storage".to_string(),
            UrlSigner::new("test-secret").unwrap(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_local_storage_upload_download() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let data = Bytes::from_static(b"\x00\xffbinary\r\n--");
        storage
            .upload("uid/file-1/test.bin", data.clone(), "application/octet-stream")
            .await
            .unwrap();

        let downloaded = storage.download("uid/file-1/test.bin").await.unwrap();
        assert_eq!(data, downloaded);
    }

    #[tokio::test]
    async fn test_upload_replaces_existing_object() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        for body in [&b"first"[..], &b"second"[..]] {
            storage
                .upload("uid/file-1/a.txt", Bytes::copy_from_slice(body), "text/plain")
                .await
                .unwrap();
        }

        let downloaded = storage.download("uid/file-1/a.txt").await.unwrap();
        assert_eq!(&downloaded[..], b"second");
        let entries: Vec<_> = std::fs::read_dir(dir.path().join("uid/file-1"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("a.txt")]);
    }

    #[tokio::test]
    async fn test_upload_accepts_maximum_length_name() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let name = format!("{}.pdf", "a".repeat(251));
        assert_eq!(name.len(), 255);
        let key = format!("alice/0f8fad5b/{}", name);
        storage
            .upload(&key, Bytes::from_static(b"%PDF"), "application/pdf")
            .await
            .unwrap();

        assert_eq!(&storage.download(&key).await.unwrap()[..], b"%PDF");
        let entries: Vec<_> = std::fs::read_dir(dir.path().join("alice/0f8fad5b"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from(name)]);
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage.download("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete("../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_local_storage_delete_nonexistent() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage.delete("nonexistent/file.txt").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_delete_prunes_empty_directories() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        storage
            .upload("uid/file-1/a.txt", Bytes::from_static(b"a"), "text/plain")
            .await
            .unwrap();
        storage.delete("uid/file-1/a.txt").await.unwrap();

        assert!(!storage.exists("uid/file-1/a.txt").await.unwrap());
        assert!(!dir.path().join("uid").exists());
        assert!(dir.path().exists());
    }

    #[tokio::test]
    async fn test_local_storage_download_missing() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage.download("uid/file-1/missing.txt").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_presigned_url_is_verifiable() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let url = storage
            .get_presigned_url("uid/file-1/my report.pdf", Duration::from_secs(3600))
            .await
            .unwrap();
        assert!(url.starts_with("http://localhost:4000/storage/uid/file-1/my%20report.pdf?expires="));

        let query = url.split_once('?').unwrap().1;
        let mut expires = 0u64;
        let mut signature = String::new();
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("expires", v)) => expires = v.parse().unwrap(),
                Some(("signature", v)) => signature = v.to_string(),
                _ => {}
            }
        }
        assert!(storage
            .signer()
            .verify("uid/file-1/my report.pdf", expires, &signature)
            .is_ok());
    }
}

#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{InMemoryStorage, Storage, StorageBackend, StorageError, StorageResult};
#[cfg(feature = "storage-local")]
use crate::UrlSigner;
use filedrive_core::Config;
use std::sync::Arc;

#[allow(dead_code)]
fn required<'a>(value: Option<&'a str>, name: &str) -> StorageResult<&'a str> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| StorageError::ConfigError(format!("{} not configured", name)))
}

fn unavailable(backend: StorageBackend, feature: &str) -> StorageError {
    StorageError::ConfigError(format!(
        "{} storage backend not available ({} feature not enabled)",
        backend, feature
    ))
}

/// Build the object store selected by `STORAGE_BACKEND`.
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let backend = config.storage_backend();
    match backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = required(config.s3_bucket(), "S3_BUCKET")?;
            let region = required(
                config.s3_region().or_else(|| config.aws_region()),
                "S3_REGION or AWS_REGION",
            )?;
            let storage = S3Storage::new(
                bucket.to_string(),
                region.to_string(),
                config.s3_endpoint().map(String::from),
            )
            .await?;
            Ok(Arc::new(storage))
        }

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = required(config.local_storage_path(), "LOCAL_STORAGE_PATH")?;
            let base_url = required(config.local_storage_base_url(), "LOCAL_STORAGE_BASE_URL")?;
            let signer = UrlSigner::new(required(
                config.storage_signing_secret(),
                "STORAGE_SIGNING_SECRET",
            )?)?;
            let storage = LocalStorage::new(base_path, base_url.to_string(), signer).await?;
            Ok(Arc::new(storage))
        }

        StorageBackend::Memory => {
            tracing::warn!("Using in-memory object storage; files are lost on restart");
            Ok(Arc::new(InMemoryStorage::new()))
        }

        #[allow(unreachable_patterns)]
        StorageBackend::S3 => Err(unavailable(backend, "storage-s3")),
        #[allow(unreachable_patterns)]
        StorageBackend::Local => Err(unavailable(backend, "storage-local")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
    }

    #[tokio::test]
    async fn memory_backend_needs_no_settings() {
        let storage = create_storage(&config(&[("STORAGE_BACKEND", "memory")]))
            .await
            .unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Memory);
    }

    #[cfg(feature = "storage-local")]
    #[tokio::test]
    async fn local_backend_reports_missing_settings() {
        let err = create_storage(&config(&[
            ("STORAGE_BACKEND", "local"),
            ("LOCAL_STORAGE_PATH", "/tmp/filedrive-factory-test"),
        ]))
        .await
        .err()
        .unwrap();
        assert_eq!(
            err.to_string(),
            "Configuration error: LOCAL_STORAGE_BASE_URL not configured"
        );
    }
}

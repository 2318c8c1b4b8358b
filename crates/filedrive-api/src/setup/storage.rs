//! Storage setup and initialization

use anyhow::{Context, Result};
use filedrive_core::{Config, StorageBackend};
use filedrive_storage::{create_storage, Storage, UrlSigner};
use std::sync::Arc;

/// Setup storage; for the local backend also return the signer that checks its download URLs.
pub async fn setup_storage(config: &Config) -> Result<(Arc<dyn Storage>, Option<UrlSigner>)> {
    tracing::info!("Initializing storage abstraction...");
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage")?;
    let backend_type = storage.backend_type();
    tracing::info!(backend = %backend_type, "Storage abstraction initialized successfully");

    let url_signer = if backend_type == StorageBackend::Local {
        let secret = config
            .storage_signing_secret()
            .context("STORAGE_SIGNING_SECRET must be set when using local storage backend")?;
        Some(UrlSigner::new(secret).context("Invalid STORAGE_SIGNING_SECRET")?)
    } else {
        None
    };

    Ok((storage, url_signer))
}

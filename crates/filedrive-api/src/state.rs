//! Application state shared by handlers and the gateway adapter.
//!
//! Every client is constructed once in `setup` and injected here.

use crate::auth::IdentityVerifier;
use crate::services::FileService;
use filedrive_core::Config;
use filedrive_db::FileMetadataStore;
use filedrive_storage::{Storage, UrlSigner};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub files: FileService,
    pub verifier: Arc<dyn IdentityVerifier>,
    /// Verifies signed download URLs; set only for the local storage backend.
    pub url_signer: Option<UrlSigner>,
}

impl AppState {
    pub fn new(
        config: Config,
        storage: Arc<dyn Storage>,
        metadata: Arc<dyn FileMetadataStore>,
        verifier: Arc<dyn IdentityVerifier>,
        url_signer: Option<UrlSigner>,
    ) -> Self {
        let files = FileService::new(storage, metadata, &config);
        Self {
            config: Arc::new(config),
            files,
            verifier,
            url_signer,
        }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        self.files.storage()
    }

    pub fn metadata(&self) -> &Arc<dyn FileMetadataStore> {
        self.files.metadata()
    }
}

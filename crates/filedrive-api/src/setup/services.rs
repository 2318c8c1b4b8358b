//! Service and client construction

use crate::auth::{FirebaseVerifier, IdentityVerifier, SharedSecretVerifier};
use crate::services::CleanupService;
use crate::state::AppState;
use anyhow::{Context, Result};
use filedrive_core::config::AuthProvider;
use filedrive_core::Config;
use std::sync::Arc;

/// Build the identity verifier selected by `AUTH_PROVIDER`.
pub fn setup_verifier(config: &Config) -> Result<Arc<dyn IdentityVerifier>> {
    let verifier: Arc<dyn IdentityVerifier> = match config.auth_provider {
        AuthProvider::Firebase => {
            let project_id = config
                .firebase_project_id
                .clone()
                .context("FIREBASE_PROJECT_ID must be set when AUTH_PROVIDER=firebase")?;
            tracing::info!(project_id = %project_id, "Using Firebase token verification");
            Arc::new(FirebaseVerifier::new(
                project_id,
                config.firebase_jwks_url.clone(),
                None,
            ))
        }
        AuthProvider::Jwt => {
            let secret = config
                .jwt_secret
                .as_deref()
                .context("JWT_SECRET must be set when AUTH_PROVIDER=jwt")?;
            tracing::info!("Using shared-secret token verification");
            Arc::new(SharedSecretVerifier::new(secret))
        }
    };
    Ok(verifier)
}

/// Construct every client once and assemble the shared state.
pub async fn initialize_services(config: &Config) -> Result<Arc<AppState>> {
    let metadata = super::database::setup_metadata_store(config).await?;
    let (storage, url_signer) = super::storage::setup_storage(config).await?;
    let verifier = setup_verifier(config)?;

    let state = AppState::new(config.clone(), storage, metadata, verifier, url_signer);
    tracing::info!(
        max_file_size_bytes = config.max_file_size_bytes(),
        file_ttl_days = config.file_ttl_days,
        metadata_write_max_attempts = config.metadata_write_max_attempts,
        "File service initialized"
    );

    Ok(Arc::new(state))
}

/// Start the expired-file sweep when an interval is configured.
pub fn start_cleanup(config: &Config, state: &AppState) -> Option<tokio::task::JoinHandle<()>> {
    let every = config.cleanup_interval()?;
    let cleanup = Arc::new(CleanupService::new(
        state.metadata().clone(),
        state.storage().clone(),
    ));
    tracing::info!(interval_secs = every.as_secs(), "Expired-file cleanup started");
    Some(cleanup.start(every))
}

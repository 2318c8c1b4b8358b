//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;

use crate::state::AppState;
use anyhow::{Context, Result};
use filedrive_core::Config;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.log_json);
    tracing::info!(
        environment = %config.environment,
        storage_backend = %config.storage_backend(),
        "Configuration loaded and validated successfully"
    );

    let state = services::initialize_services(&config).await?;
    services::start_cleanup(&config, &state);

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}

/// Build the shared state without serving HTTP or starting background tasks.
pub async fn initialize_state(config: Config) -> Result<Arc<AppState>> {
    config.validate().context("Configuration validation failed")?;
    crate::telemetry::init_telemetry(config.log_json);
    services::initialize_services(&config).await
}

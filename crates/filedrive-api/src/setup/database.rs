//! Metadata store setup

use anyhow::{Context, Result};
use filedrive_core::{Config, MetadataBackend};
use filedrive_db::{FileMetadataStore, InMemoryFileMetadataStore, PgFileMetadataStore};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Build the configured metadata store.
pub async fn setup_metadata_store(config: &Config) -> Result<Arc<dyn FileMetadataStore>> {
    match config.metadata_backend() {
        MetadataBackend::Postgres => {
            let pool = setup_database(config).await?;
            Ok(Arc::new(PgFileMetadataStore::new(pool)))
        }
        MetadataBackend::Memory => {
            tracing::warn!("Using in-memory metadata store; records are lost on restart");
            Ok(Arc::new(InMemoryFileMetadataStore::new()))
        }
    }
}

/// Setup database connection pool and run migrations
pub async fn setup_database(config: &Config) -> Result<PgPool> {
    let database_url = config
        .database_url()
        .context("DATABASE_URL must be set when using the postgres metadata backend")?;

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!(
        max_connections = config.db_max_connections,
        "Database connected successfully"
    );

    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    let migrator = sqlx::migrate::Migrator::new(migrations_dir)
        .await
        .context("Failed to load migrations")?;
    migrator
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}

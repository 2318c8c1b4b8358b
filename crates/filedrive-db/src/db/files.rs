//! File metadata repository: CRUD for the user_files table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use filedrive_core::models::FileRecord;
use filedrive_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Metadata store operations used by the file service.
///
/// Records whose `expires_at` has passed are treated as absent by reads, matching a
/// key-value store's TTL expiry; `scan_expired` finds them for physical removal.
#[async_trait]
pub trait FileMetadataStore: Send + Sync {
    /// Insert or replace the record for `(record.user_id, record.file_id)`.
    async fn put_item(&self, record: &FileRecord) -> Result<(), AppError>;

    async fn get_item(&self, user_id: &str, file_id: Uuid)
        -> Result<Option<FileRecord>, AppError>;

    /// All live records for a user, newest first.
    async fn query_by_user(&self, user_id: &str) -> Result<Vec<FileRecord>, AppError>;

    /// Delete a record. Returns whether a record existed.
    async fn delete_item(&self, user_id: &str, file_id: Uuid) -> Result<bool, AppError>;

    /// Up to `limit` records that expired at or before `now`, oldest expiry first.
    async fn scan_expired(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<FileRecord>, AppError>;

    /// Cheap connectivity check for health endpoints.
    async fn ping(&self) -> Result<(), AppError>;
}

const SELECT_COLUMNS: &str =
    "user_id, file_id, file_name, file_key, file_type, file_size, upload_date, expires_at";

/// PostgreSQL-backed metadata store.
#[derive(Clone)]
pub struct PgFileMetadataStore {
    pool: PgPool,
}

impl PgFileMetadataStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileMetadataStore for PgFileMetadataStore {
    #[tracing::instrument(skip(self, record), fields(db.table = "user_files", db.record_id = %record.file_id))]
    async fn put_item(&self, record: &FileRecord) -> Result<(), AppError> {
        sqlx::query::<Postgres>(
            r#"
            INSERT INTO user_files
                (user_id, file_id, file_name, file_key, file_type, file_size, upload_date, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id, file_id) DO UPDATE SET
                file_name = EXCLUDED.file_name,
                file_key = EXCLUDED.file_key,
                file_type = EXCLUDED.file_type,
                file_size = EXCLUDED.file_size,
                upload_date = EXCLUDED.upload_date,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(&record.user_id)
        .bind(record.file_id)
        .bind(&record.file_name)
        .bind(&record.file_key)
        .bind(&record.file_type)
        .bind(record.file_size)
        .bind(record.upload_date)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "user_files", db.record_id = %file_id))]
    async fn get_item(
        &self,
        user_id: &str,
        file_id: Uuid,
    ) -> Result<Option<FileRecord>, AppError> {
        let row = sqlx::query_as::<Postgres, FileRecord>(&format!(
            "SELECT {} FROM user_files \
             WHERE user_id = $1 AND file_id = $2 \
             AND (expires_at IS NULL OR expires_at > NOW())",
            SELECT_COLUMNS
        ))
        .bind(user_id)
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "user_files"))]
    async fn query_by_user(&self, user_id: &str) -> Result<Vec<FileRecord>, AppError> {
        let rows = sqlx::query_as::<Postgres, FileRecord>(&format!(
            "SELECT {} FROM user_files \
             WHERE user_id = $1 AND (expires_at IS NULL OR expires_at > NOW()) \
             ORDER BY upload_date DESC, file_id",
            SELECT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    #[tracing::instrument(skip(self), fields(db.table = "user_files", db.record_id = %file_id))]
    async fn delete_item(&self, user_id: &str, file_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query::<Postgres>(
            "DELETE FROM user_files WHERE user_id = $1 AND file_id = $2",
        )
        .bind(user_id)
        .bind(file_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "user_files"))]
    async fn scan_expired(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<FileRecord>, AppError> {
        let rows = sqlx::query_as::<Postgres, FileRecord>(&format!(
            "SELECT {} FROM user_files \
             WHERE expires_at IS NOT NULL AND expires_at <= $1 \
             ORDER BY expires_at \
             LIMIT $2",
            SELECT_COLUMNS
        ))
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query::<Postgres>("SELECT 1")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

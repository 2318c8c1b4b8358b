use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

/// Metadata record for one stored file.
///
/// Records are keyed by `(user_id, file_id)`; `file_key` is the object-store key holding the bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub file_id: Uuid,
    pub user_id: String,
    pub file_name: String,
    pub file_key: String,
    pub file_type: String,
    pub file_size: i64,
    pub upload_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl FileRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

/// Listing entry returned by `GET /files`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub file_id: Uuid,
    pub file_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub upload_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<FileRecord> for FileSummary {
    fn from(record: FileRecord) -> Self {
        FileSummary {
            file_id: record.file_id,
            file_name: record.file_name,
            file_type: record.file_type,
            file_size: record.file_size,
            upload_date: record.upload_date,
            expires_at: record.expires_at,
        }
    }
}

/// Full metadata plus a time-limited download link.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileDetail {
    #[serde(flatten)]
    pub file: FileRecord,
    pub download_url: String,
}

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A file recovered from an upload request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    pub file_name: String,
    pub content_type: String,
    pub content: Bytes,
}

impl ExtractedFile {
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// Response body for a successful upload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub message: String,
    pub file_id: Uuid,
    pub file_name: String,
    pub size: u64,
    pub content_type: String,
}

//! Defaults shared by configuration and the upload pipeline.

/// Content type used when a part or JSON upload does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_MAX_FILE_SIZE_MB: usize = 50;
pub const DEFAULT_FILE_TTL_DAYS: i64 = 1;
pub const DEFAULT_PRESIGNED_URL_TTL_SECS: u64 = 3600;
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_METADATA_WRITE_MAX_ATTEMPTS: u32 = 3;

/// Longest file name accepted after sanitisation.
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Minimum length for the HS256 shared secret.
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

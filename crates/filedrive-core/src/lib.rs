//! Filedrive Core Library
//!
//! This crate provides core domain models, error types and configuration
//! shared across all Filedrive components.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{ExtractedFile, FileDetail, FileRecord, FileSummary, UploadReceipt, UserIdentity};
pub use storage_types::{MetadataBackend, StorageBackend};

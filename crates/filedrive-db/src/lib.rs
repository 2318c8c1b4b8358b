//! Filedrive metadata store
//!
//! File metadata records live in a key-value style table keyed by `(user_id, file_id)`.

pub mod db;

pub use db::{FileMetadataStore, InMemoryFileMetadataStore, PgFileMetadataStore};

//! Metadata repositories
//!
//! `FileMetadataStore` is the seam the file service depends on; `PgFileMetadataStore`
//! backs it with PostgreSQL and `InMemoryFileMetadataStore` with a process-local map.

mod files;
mod memory;

pub use files::{FileMetadataStore, PgFileMetadataStore};
pub use memory::InMemoryFileMetadataStore;

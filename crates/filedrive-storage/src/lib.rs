//! Filedrive Storage Library
//!
//! This crate provides the object storage abstraction and its implementations:
//! S3 (via `object_store`), the local filesystem and an in-memory store.
//!
//! # Storage key format
//!
//! Every object lives under `{user_id}/{file_id}/{file_name}`. Keys must not contain
//! `..` or a leading `/`. Key generation is centralized in the `keys` module so all
//! backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod signing;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use filedrive_core::StorageBackend;
pub use keys::generate_storage_key;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use memory::InMemoryStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use signing::UrlSigner;
pub use traits::{Storage, StorageError, StorageResult};

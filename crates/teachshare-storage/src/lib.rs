//! TeachShare Storage Library
//!
//! This crate provides the document store: the `Storage` trait and its
//! implementations for S3-compatible object stores, the local filesystem, and
//! an in-memory backend used by tests.
//!
//! # Storage key format
//!
//! Canonical documents are stored under `documents/{uuid}.{extension}`. Keys are
//! minted fresh for every physical write and never derived from database
//! identifiers. Keys must not contain `..` or a leading `/`. Key generation is
//! centralized in the `keys` module so all backends stay consistent.
//!
//! Each backend instance is bound to one bucket at construction.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-memory")]
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::generate_document_key;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-memory")]
pub use memory::MemoryStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use teachshare_core::StorageBackend;
pub use traits::{Storage, StorageError, StorageResult};

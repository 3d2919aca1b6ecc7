//! TeachShare Core Library
//!
//! This crate provides the domain models, error types, configuration, and validation
//! shared by every TeachShare component: the ingestion pipeline, the moderation
//! workflow, rating aggregation, and the persistence adapters behind them.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::{BaseConfig, Config, TeachShareConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
// Storage, StorageError, StorageResult live in teachshare-storage

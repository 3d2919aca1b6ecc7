//! TeachShare Services Layer
//!
//! Orchestrates the document lifecycle over the persistence, storage and
//! processing crates: ingestion with content deduplication, moderation,
//! rating, search and reporting. [`TeachShare`] is the single entry point
//! callers (the CLI, an HTTP layer) depend on.

pub mod facade;
pub mod services;
pub mod setup;

pub use facade::{TeachShare, TeachShareSettings};
pub use services::{
    CatalogService, IngestRequest, IngestService, ModerationService, RatingService,
    ReportService,
};
pub use setup::build_from_config;

pub use teachshare_db::Repositories;
pub use teachshare_storage::{create_storage, Storage, StorageBackend, StorageError};

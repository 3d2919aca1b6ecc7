pub mod catalog;
pub mod ingest;
pub mod moderation;
pub mod rating;
pub mod report;

pub use catalog::CatalogService;
pub use ingest::{IngestRequest, IngestService};
pub use moderation::ModerationService;
pub use rating::RatingService;
pub use report::ReportService;

use teachshare_core::AppError;
use teachshare_storage::StorageError;

pub(crate) fn storage_write_error(err: StorageError) -> AppError {
    AppError::StorageWriteFailed(err.to_string())
}

pub(crate) fn storage_read_error(err: StorageError) -> AppError {
    AppError::StorageReadFailed(err.to_string())
}

//! Data models for the application
//!
//! Each sub-module represents one record kind owned by the ingestion pipeline,
//! the moderation workflow, or the rating aggregator.

mod caller;
mod document;
mod fingerprint;
mod moderation;
mod rating;
mod report;
mod search;
mod stored_object;

pub use caller::*;
pub use document::*;
pub use fingerprint::*;
pub use moderation::*;
pub use rating::*;
pub use report::*;
pub use search::*;
pub use stored_object::*;

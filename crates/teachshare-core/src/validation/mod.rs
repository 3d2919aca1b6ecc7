//! Validation modules

pub mod grade;
pub mod identity;

pub use grade::normalize_grade;
pub use identity::{parse_document_id, require_non_empty};

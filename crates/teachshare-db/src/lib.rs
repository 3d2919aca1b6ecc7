//! TeachShare persistence
//!
//! Repository traits for document metadata, the deduplication index, rating
//! aggregates, the moderation audit log and user reports, with PostgreSQL
//! implementations and (behind the `memory` feature) in-memory ones.

pub mod db;

pub use db::{
    run_migrations, setup_database, DocumentRepository, ModerationLog, ObjectIndex,
    PostgresDocumentRepository, PostgresModerationLog, PostgresObjectIndex,
    PostgresRatingRepository, PostgresReportRepository, RatingRepository, RegisterOutcome,
    ReportRepository, Repositories,
};

#[cfg(feature = "memory")]
pub use db::InMemoryDatabase;

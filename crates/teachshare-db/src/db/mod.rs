//! Database repositories
//!
//! Each capability is an async trait with a PostgreSQL implementation. Every
//! PostgreSQL call runs under a per-call deadline (see [`deadline`]).
//
// Per-call deadlines
pub mod deadline;
//
// Repositories
pub mod document;
pub mod moderation;
pub mod object_index;
pub mod rating;
pub mod report;
//
// Pool setup and migrations
pub mod pool;
//
// Transaction utilities
pub mod transaction;
//
// In-memory adapters
#[cfg(feature = "memory")]
pub mod memory;

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

pub use document::{DocumentRepository, PostgresDocumentRepository};
#[cfg(feature = "memory")]
pub use memory::InMemoryDatabase;
pub use moderation::{ModerationLog, PostgresModerationLog};
pub use object_index::{ObjectIndex, PostgresObjectIndex, RegisterOutcome};
pub use pool::{run_migrations, setup_database};
pub use rating::{PostgresRatingRepository, RatingRepository};
pub use report::{PostgresReportRepository, ReportRepository};

/// The full set of repository handles the services need.
#[derive(Clone)]
pub struct Repositories {
    pub documents: Arc<dyn DocumentRepository>,
    pub objects: Arc<dyn ObjectIndex>,
    pub ratings: Arc<dyn RatingRepository>,
    pub moderation: Arc<dyn ModerationLog>,
    pub reports: Arc<dyn ReportRepository>,
}

impl Repositories {
    /// PostgreSQL-backed repositories sharing one pool and deadline.
    pub fn postgres(pool: PgPool, timeout: Duration) -> Self {
        Self {
            documents: Arc::new(PostgresDocumentRepository::new(pool.clone(), timeout)),
            objects: Arc::new(PostgresObjectIndex::new(pool.clone(), timeout)),
            ratings: Arc::new(PostgresRatingRepository::new(pool.clone(), timeout)),
            moderation: Arc::new(PostgresModerationLog::new(pool.clone(), timeout)),
            reports: Arc::new(PostgresReportRepository::new(pool, timeout)),
        }
    }

    /// Every repository backed by the same in-memory database.
    #[cfg(feature = "memory")]
    pub fn in_memory(db: InMemoryDatabase) -> Self {
        Self {
            documents: Arc::new(db.clone()),
            objects: Arc::new(db.clone()),
            ratings: Arc::new(db.clone()),
            moderation: Arc::new(db.clone()),
            reports: Arc::new(db),
        }
    }
}

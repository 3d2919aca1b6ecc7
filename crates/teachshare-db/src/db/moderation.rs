use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use teachshare_core::models::{ModerationDecision, ModerationState, NewModerationDecision};
use teachshare_core::AppError;
use uuid::Uuid;

use super::deadline::with_deadline;

/// Append-only audit log of moderation decisions.
#[async_trait]
pub trait ModerationLog: Send + Sync {
    async fn record(&self, decision: NewModerationDecision)
        -> Result<ModerationDecision, AppError>;

    /// Decisions for one document, oldest first.
    async fn history(&self, document_id: Uuid) -> Result<Vec<ModerationDecision>, AppError>;
}

#[derive(sqlx::FromRow)]
struct DecisionRow {
    id: Uuid,
    document_id: Uuid,
    reviewer_id: String,
    decision: ModerationState,
    comments: String,
    decided_at: DateTime<Utc>,
}

impl From<DecisionRow> for ModerationDecision {
    fn from(row: DecisionRow) -> Self {
        Self {
            id: row.id,
            document_id: row.document_id,
            reviewer_id: row.reviewer_id,
            decision: row.decision,
            comments: row.comments,
            decided_at: row.decided_at,
        }
    }
}

#[derive(Clone)]
pub struct PostgresModerationLog {
    pool: PgPool,
    timeout: Duration,
}

impl PostgresModerationLog {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn insert(&self, decision: NewModerationDecision) -> Result<ModerationDecision, AppError> {
        let row = sqlx::query_as::<Postgres, DecisionRow>(
            r#"
            INSERT INTO moderation_decisions (id, document_id, reviewer_id, decision, comments)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, document_id, reviewer_id, decision, comments, decided_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(decision.document_id)
        .bind(&decision.reviewer_id)
        .bind(decision.decision)
        .bind(&decision.comments)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn select_for_document(
        &self,
        document_id: Uuid,
    ) -> Result<Vec<ModerationDecision>, AppError> {
        let rows = sqlx::query_as::<Postgres, DecisionRow>(
            r#"
            SELECT id, document_id, reviewer_id, decision, comments, decided_at
            FROM moderation_decisions
            WHERE document_id = $1
            ORDER BY decided_at ASC, seq ASC
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl ModerationLog for PostgresModerationLog {
    #[tracing::instrument(skip(self, decision), fields(db.table = "moderation_decisions", db.operation = "insert", db.record_id = %decision.document_id))]
    async fn record(
        &self,
        decision: NewModerationDecision,
    ) -> Result<ModerationDecision, AppError> {
        with_deadline(
            self.timeout,
            "moderation_decisions.insert",
            self.insert(decision),
        )
        .await
    }

    #[tracing::instrument(skip(self), fields(db.table = "moderation_decisions", db.operation = "select", db.record_id = %document_id))]
    async fn history(&self, document_id: Uuid) -> Result<Vec<ModerationDecision>, AppError> {
        with_deadline(
            self.timeout,
            "moderation_decisions.select",
            self.select_for_document(document_id),
        )
        .await
    }
}

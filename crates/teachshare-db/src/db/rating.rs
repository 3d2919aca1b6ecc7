use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use teachshare_core::models::RatingAggregate;
use teachshare_core::AppError;
use uuid::Uuid;

use super::deadline::with_deadline;

/// Rating aggregates, one per document.
#[async_trait]
pub trait RatingRepository: Send + Sync {
    /// Fold `score` into the document's aggregate in one atomic step.
    async fn add_rating(&self, document_id: Uuid, score: i32)
        -> Result<RatingAggregate, AppError>;

    async fn get_by_document(&self, document_id: Uuid)
        -> Result<Option<RatingAggregate>, AppError>;
}

#[derive(sqlx::FromRow)]
struct RatingRow {
    id: Uuid,
    document_id: Uuid,
    times_rated: i64,
    total_rating: i64,
    average_rating: f64,
}

impl From<RatingRow> for RatingAggregate {
    fn from(row: RatingRow) -> Self {
        Self {
            id: row.id,
            document_id: row.document_id,
            times_rated: row.times_rated,
            total_rating: row.total_rating,
            average_rating: row.average_rating,
        }
    }
}

#[derive(Clone)]
pub struct PostgresRatingRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PostgresRatingRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn increment(&self, document_id: Uuid, score: i32) -> Result<RatingAggregate, AppError> {
        // Right-hand sides see the pre-update row, so the mean is computed
        // against the new totals without a read in application code.
        let row = sqlx::query_as::<Postgres, RatingRow>(
            r#"
            UPDATE ratings
            SET times_rated = times_rated + 1,
                total_rating = total_rating + $2,
                average_rating = (total_rating + $2)::float8 / (times_rated + 1)
            WHERE document_id = $1
            RETURNING id, document_id, times_rated, total_rating, average_rating
            "#,
        )
        .bind(document_id)
        .bind(i64::from(score))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Rating for document {} not found", document_id))
        })?;

        Ok(row.into())
    }

    async fn select(&self, document_id: Uuid) -> Result<Option<RatingAggregate>, AppError> {
        let row = sqlx::query_as::<Postgres, RatingRow>(
            r#"
            SELECT id, document_id, times_rated, total_rating, average_rating
            FROM ratings
            WHERE document_id = $1
            "#,
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl RatingRepository for PostgresRatingRepository {
    #[tracing::instrument(skip(self), fields(db.table = "ratings", db.operation = "update", db.record_id = %document_id))]
    async fn add_rating(
        &self,
        document_id: Uuid,
        score: i32,
    ) -> Result<RatingAggregate, AppError> {
        with_deadline(
            self.timeout,
            "ratings.increment",
            self.increment(document_id, score),
        )
        .await
    }

    #[tracing::instrument(skip(self), fields(db.table = "ratings", db.operation = "select", db.record_id = %document_id))]
    async fn get_by_document(
        &self,
        document_id: Uuid,
    ) -> Result<Option<RatingAggregate>, AppError> {
        with_deadline(self.timeout, "ratings.select", self.select(document_id)).await
    }
}

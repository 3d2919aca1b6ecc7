use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use teachshare_core::models::{NewReport, ReportRecord};
use teachshare_core::AppError;
use uuid::Uuid;

use super::deadline::with_deadline;

/// User reports against documents.
#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn create(&self, report: NewReport) -> Result<ReportRecord, AppError>;

    async fn list_for_document(&self, document_id: Uuid) -> Result<Vec<ReportRecord>, AppError>;
}

#[derive(sqlx::FromRow)]
struct ReportRow {
    id: Uuid,
    document_id: Uuid,
    reporter_id: String,
    reason: String,
    reported_at: DateTime<Utc>,
}

impl From<ReportRow> for ReportRecord {
    fn from(row: ReportRow) -> Self {
        Self {
            id: row.id,
            document_id: row.document_id,
            reporter_id: row.reporter_id,
            reason: row.reason,
            reported_at: row.reported_at,
        }
    }
}

#[derive(Clone)]
pub struct PostgresReportRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PostgresReportRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn insert(&self, report: NewReport) -> Result<ReportRecord, AppError> {
        let row = sqlx::query_as::<Postgres, ReportRow>(
            r#"
            INSERT INTO document_reports (id, document_id, reporter_id, reason)
            VALUES ($1, $2, $3, $4)
            RETURNING id, document_id, reporter_id, reason, reported_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(report.document_id)
        .bind(&report.reporter_id)
        .bind(&report.reason)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn select_for_document(&self, document_id: Uuid) -> Result<Vec<ReportRecord>, AppError> {
        let rows = sqlx::query_as::<Postgres, ReportRow>(
            r#"
            SELECT id, document_id, reporter_id, reason, reported_at
            FROM document_reports
            WHERE document_id = $1
            ORDER BY reported_at DESC
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl ReportRepository for PostgresReportRepository {
    #[tracing::instrument(skip(self, report), fields(db.table = "document_reports", db.operation = "insert", db.record_id = %report.document_id))]
    async fn create(&self, report: NewReport) -> Result<ReportRecord, AppError> {
        with_deadline(self.timeout, "document_reports.insert", self.insert(report)).await
    }

    #[tracing::instrument(skip(self), fields(db.table = "document_reports", db.operation = "select", db.record_id = %document_id))]
    async fn list_for_document(&self, document_id: Uuid) -> Result<Vec<ReportRecord>, AppError> {
        with_deadline(
            self.timeout,
            "document_reports.select",
            self.select_for_document(document_id),
        )
        .await
    }
}

use std::sync::Arc;

use teachshare_core::models::{NewReport, ReportRecord};
use teachshare_core::validation::require_non_empty;
use teachshare_core::AppError;
use teachshare_db::{DocumentRepository, ReportRepository};
use uuid::Uuid;

#[derive(Clone)]
pub struct ReportService {
    documents: Arc<dyn DocumentRepository>,
    reports: Arc<dyn ReportRepository>,
}

impl ReportService {
    pub fn new(documents: Arc<dyn DocumentRepository>, reports: Arc<dyn ReportRepository>) -> Self {
        Self { documents, reports }
    }

    /// Flag a document as reported, hiding it from public search, and keep
    /// the report itself for reviewers.
    #[tracing::instrument(skip(self, reason), fields(document_id = %document_id, reporter_id = %reporter_id))]
    pub async fn report(
        &self,
        document_id: Uuid,
        reporter_id: &str,
        reason: &str,
    ) -> Result<ReportRecord, AppError> {
        let reporter_id = require_non_empty("reporter_id", reporter_id)?;
        let reason = require_non_empty("reason", reason)?;

        self.documents.set_reported(document_id).await?;
        let record = self
            .reports
            .create(NewReport {
                document_id,
                reporter_id,
                reason,
            })
            .await?;

        tracing::info!(report_id = %record.id, "Document reported");
        Ok(record)
    }

    /// Reports filed against a document, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn reports(&self, document_id: Uuid) -> Result<Vec<ReportRecord>, AppError> {
        if self.documents.find_by_id(document_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Document {} not found",
                document_id
            )));
        }
        self.reports.list_for_document(document_id).await
    }
}

//! The `TeachShare` facade: every operation the document-sharing core exposes.

use std::sync::Arc;
use std::time::Duration;

use teachshare_core::config::{MAX_DOCUMENT_SIZE_MB, PRESIGNED_URL_EXPIRY_SECS};
use teachshare_core::models::{
    Caller, DocumentMetadata, ModerationDecision, ModerationState, RatingAggregate, ReportRecord,
    SearchFilter, VisibilityScope,
};
use teachshare_core::{AppError, Config};
use teachshare_db::Repositories;
use teachshare_storage::Storage;
use uuid::Uuid;

use crate::services::{
    CatalogService, IngestRequest, IngestService, ModerationService, RatingService,
    ReportService,
};

/// Limits the services apply that come from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeachShareSettings {
    pub max_document_size_bytes: usize,
    pub presigned_url_expiry: Duration,
}

impl Default for TeachShareSettings {
    fn default() -> Self {
        Self {
            max_document_size_bytes: MAX_DOCUMENT_SIZE_MB * 1024 * 1024,
            presigned_url_expiry: Duration::from_secs(PRESIGNED_URL_EXPIRY_SECS),
        }
    }
}

impl TeachShareSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_document_size_bytes: config.max_document_size_bytes(),
            presigned_url_expiry: config.presigned_url_expiry(),
        }
    }
}

/// Entry point for callers.
///
/// Cheap to clone; every service holds only shared handles, so one instance
/// can serve any number of concurrent requests.
#[derive(Clone)]
pub struct TeachShare {
    ingest: IngestService,
    moderation: ModerationService,
    ratings: RatingService,
    catalog: CatalogService,
    reports: ReportService,
}

impl TeachShare {
    pub fn new(
        repositories: Repositories,
        storage: Arc<dyn Storage>,
        settings: TeachShareSettings,
    ) -> Self {
        Self {
            ingest: IngestService::new(
                repositories.documents.clone(),
                repositories.objects.clone(),
                storage.clone(),
                settings.max_document_size_bytes,
            ),
            moderation: ModerationService::new(
                repositories.documents.clone(),
                repositories.moderation.clone(),
            ),
            ratings: RatingService::new(repositories.ratings.clone()),
            catalog: CatalogService::new(
                repositories.documents.clone(),
                storage,
                settings.presigned_url_expiry,
            ),
            reports: ReportService::new(repositories.documents, repositories.reports),
        }
    }

    /// Normalize, deduplicate and store an upload; returns the new `Pending`
    /// document.
    pub async fn ingest(
        &self,
        payload: Vec<u8>,
        filename: &str,
        owner_id: &str,
        title: &str,
        subject: &str,
        grade: &str,
    ) -> Result<DocumentMetadata, AppError> {
        self.ingest
            .ingest(IngestRequest {
                payload,
                filename: filename.to_string(),
                declared_type: None,
                owner_id: owner_id.to_string(),
                title: title.to_string(),
                subject: subject.to_string(),
                grade: grade.to_string(),
            })
            .await
    }

    /// Ingest with the client's declared content type as a detection fallback.
    pub async fn ingest_request(&self, request: IngestRequest) -> Result<DocumentMetadata, AppError> {
        self.ingest.ingest(request).await
    }

    pub async fn review(
        &self,
        document_id: Uuid,
        reviewer_id: &str,
        decision: ModerationState,
        comments: &str,
    ) -> Result<ModerationDecision, AppError> {
        self.moderation
            .review(document_id, reviewer_id, decision, comments)
            .await
    }

    /// [`review`](Self::review) on behalf of an authenticated caller; only
    /// moderators and admins may review.
    pub async fn review_as(
        &self,
        caller: &Caller,
        document_id: Uuid,
        decision: ModerationState,
        comments: &str,
    ) -> Result<ModerationDecision, AppError> {
        if !caller.role.is_reviewer() {
            tracing::warn!(
                user_id = %caller.user_id,
                role = %caller.role,
                document_id = %document_id,
                "Review rejected for non-reviewer"
            );
            return Err(AppError::Forbidden(format!(
                "Role '{}' may not review documents",
                caller.role
            )));
        }
        self.review(document_id, &caller.user_id, decision, comments)
            .await
    }

    pub async fn rate(&self, document_id: Uuid, score: i32) -> Result<RatingAggregate, AppError> {
        self.ratings.rate(document_id, score).await
    }

    pub async fn rating(&self, document_id: Uuid) -> Result<RatingAggregate, AppError> {
        self.ratings.rating(document_id).await
    }

    /// Blank terms match everything; no match is an empty list.
    pub async fn search(
        &self,
        title: Option<&str>,
        subject: Option<&str>,
        grade: Option<&str>,
        scope: VisibilityScope,
    ) -> Result<Vec<DocumentMetadata>, AppError> {
        self.catalog
            .search(&SearchFilter::new(title, subject, grade, scope))
            .await
    }

    /// [`search`](Self::search) with the scope derived from the caller's role.
    pub async fn search_for(
        &self,
        caller: &Caller,
        title: Option<&str>,
        subject: Option<&str>,
        grade: Option<&str>,
    ) -> Result<Vec<DocumentMetadata>, AppError> {
        self.search(title, subject, grade, caller.scope()).await
    }

    pub async fn report(
        &self,
        document_id: Uuid,
        reporter_id: &str,
        reason: &str,
    ) -> Result<ReportRecord, AppError> {
        self.reports.report(document_id, reporter_id, reason).await
    }

    pub async fn reports(&self, document_id: Uuid) -> Result<Vec<ReportRecord>, AppError> {
        self.reports.reports(document_id).await
    }

    pub async fn document(
        &self,
        document_id: Uuid,
        scope: VisibilityScope,
    ) -> Result<DocumentMetadata, AppError> {
        self.catalog.document(document_id, scope).await
    }

    pub async fn moderation_history(
        &self,
        document_id: Uuid,
    ) -> Result<Vec<ModerationDecision>, AppError> {
        self.moderation.history(document_id).await
    }

    pub async fn download_url(
        &self,
        document_id: Uuid,
        scope: VisibilityScope,
    ) -> Result<String, AppError> {
        self.catalog.download_url(document_id, scope).await
    }

    pub async fn content(
        &self,
        document_id: Uuid,
        scope: VisibilityScope,
    ) -> Result<Vec<u8>, AppError> {
        self.catalog.content(document_id, scope).await
    }
}

use std::sync::Arc;
use std::time::Duration;

use teachshare_core::models::{DocumentMetadata, SearchFilter, VisibilityScope};
use teachshare_core::AppError;
use teachshare_db::DocumentRepository;
use teachshare_storage::Storage;
use uuid::Uuid;

use super::storage_read_error;

/// Read side: search, point lookups and access to the stored bytes.
///
/// In public scope a document that is not approved, or has been reported,
/// behaves exactly like a missing one.
#[derive(Clone)]
pub struct CatalogService {
    documents: Arc<dyn DocumentRepository>,
    storage: Arc<dyn Storage>,
    presigned_url_expiry: Duration,
}

impl CatalogService {
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        storage: Arc<dyn Storage>,
        presigned_url_expiry: Duration,
    ) -> Self {
        Self {
            documents,
            storage,
            presigned_url_expiry,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn search(&self, filter: &SearchFilter) -> Result<Vec<DocumentMetadata>, AppError> {
        let documents = self.documents.find_by_filter(filter).await?;
        tracing::debug!(results = documents.len(), "Search completed");
        Ok(documents)
    }

    #[tracing::instrument(skip(self))]
    pub async fn document(
        &self,
        document_id: Uuid,
        scope: VisibilityScope,
    ) -> Result<DocumentMetadata, AppError> {
        self.documents
            .find_by_id(document_id)
            .await?
            .filter(|doc| scope == VisibilityScope::Reviewer || doc.is_publicly_visible())
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", document_id)))
    }

    #[tracing::instrument(skip(self))]
    pub async fn download_url(
        &self,
        document_id: Uuid,
        scope: VisibilityScope,
    ) -> Result<String, AppError> {
        let document = self.document(document_id, scope).await?;
        self.storage
            .get_presigned_url(&document.storage_key, self.presigned_url_expiry)
            .await
            .map_err(storage_read_error)
    }

    #[tracing::instrument(skip(self))]
    pub async fn content(
        &self,
        document_id: Uuid,
        scope: VisibilityScope,
    ) -> Result<Vec<u8>, AppError> {
        let document = self.document(document_id, scope).await?;
        self.storage
            .download(&document.storage_key)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, storage_key = %document.storage_key, "Document store read failed");
                storage_read_error(e)
            })
    }
}

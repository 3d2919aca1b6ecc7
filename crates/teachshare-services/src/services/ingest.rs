//! Ingestion: validate → normalize → fingerprint → dedup/store → record.

use std::sync::Arc;

use chrono::Utc;
use teachshare_core::models::{
    ContentFingerprint, DocumentDetails, DocumentMetadata, NewDocument, StoredObject,
};
use teachshare_core::validation::require_non_empty;
use teachshare_core::AppError;
use teachshare_db::{DocumentRepository, ObjectIndex, RegisterOutcome};
use teachshare_processing::{fingerprint, Normalizer, UploadValidator};
use teachshare_storage::{generate_document_key, Storage};
use uuid::Uuid;

use super::storage_write_error;

/// One upload as handed over by the caller.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub payload: Vec<u8>,
    pub filename: String,
    /// Content type claimed by the client; only consulted when sniffing and
    /// the extension both fail.
    pub declared_type: Option<String>,
    pub owner_id: String,
    pub title: String,
    pub subject: String,
    pub grade: String,
}

#[derive(Clone)]
pub struct IngestService {
    documents: Arc<dyn DocumentRepository>,
    objects: Arc<dyn ObjectIndex>,
    storage: Arc<dyn Storage>,
    validator: UploadValidator,
    normalizer: Normalizer,
}

impl IngestService {
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        objects: Arc<dyn ObjectIndex>,
        storage: Arc<dyn Storage>,
        max_document_size_bytes: usize,
    ) -> Self {
        Self {
            documents,
            objects,
            storage,
            validator: UploadValidator::new(max_document_size_bytes),
            normalizer: Normalizer::default(),
        }
    }

    /// Ingest one upload and create its metadata record in `Pending` state.
    ///
    /// Byte-identical canonical content is written to the document store only
    /// once; later uploads reuse the stored object's key but still get their
    /// own metadata record and rating aggregate.
    #[tracing::instrument(skip(self, request), fields(filename = %request.filename, owner_id = %request.owner_id, size = request.payload.len()))]
    pub async fn ingest(&self, request: IngestRequest) -> Result<DocumentMetadata, AppError> {
        let owner_id = require_non_empty("owner_id", &request.owner_id)?;
        let details = DocumentDetails::new(&request.title, &request.subject, &request.grade)?;
        self.validator
            .validate_all(&request.filename, request.payload.len())?;

        let normalized = self.normalizer.normalize(
            request.payload,
            &request.filename,
            request.declared_type.as_deref(),
        )?;
        let fingerprint = fingerprint(&normalized.bytes);
        let byte_length = normalized.bytes.len() as i64;
        let converted = normalized.was_converted();

        let object = match self.objects.lookup(&fingerprint).await? {
            Some(existing) => {
                tracing::info!(
                    fingerprint = %fingerprint,
                    storage_key = %existing.storage_key,
                    "Deduplication hit, reusing stored object"
                );
                existing
            }
            None => {
                tracing::info!(fingerprint = %fingerprint, "Deduplication miss, storing new object");
                self.store_new_object(fingerprint, normalized.bytes, &normalized.content_type)
                    .await?
            }
        };

        let document = self
            .documents
            .create(NewDocument {
                id: Uuid::new_v4(),
                title: details.title,
                subject: details.subject,
                grade: details.grade,
                owner_id,
                storage_key: object.storage_key,
                filename: normalized.filename,
                content_type: normalized.content_type,
                byte_length,
                fingerprint,
                rating_id: Uuid::new_v4(),
            })
            .await?;

        tracing::info!(
            document_id = %document.id,
            storage_key = %document.storage_key,
            converted,
            "Document ingested"
        );
        Ok(document)
    }

    /// Write under a fresh key, then claim the fingerprint in the index.
    ///
    /// Losing the claim to a concurrent writer discards this write and adopts
    /// the winner's object.
    async fn store_new_object(
        &self,
        fingerprint: ContentFingerprint,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, AppError> {
        let storage_key = generate_document_key("pdf");
        let byte_length = bytes.len() as i64;

        self.storage
            .upload_with_key(&storage_key, bytes, content_type)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, storage_key = %storage_key, "Document store write failed");
                storage_write_error(e)
            })?;

        let candidate = StoredObject {
            fingerprint,
            storage_key: storage_key.clone(),
            bucket: self.storage.bucket().to_string(),
            byte_length,
            content_type: content_type.to_string(),
            created_at: Utc::now(),
        };

        match self.objects.register(candidate).await {
            Ok(RegisterOutcome::Inserted(object)) => Ok(object),
            Ok(RegisterOutcome::AlreadyPresent(winner)) => {
                tracing::warn!(
                    fingerprint = %fingerprint,
                    discarded_key = %storage_key,
                    storage_key = %winner.storage_key,
                    "Lost deduplication race, discarding duplicate object"
                );
                if let Err(e) = self.storage.delete(&storage_key).await {
                    tracing::warn!(
                        error = %e,
                        storage_key = %storage_key,
                        "Failed to delete duplicate object"
                    );
                }
                Ok(winner)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    fingerprint = %fingerprint,
                    storage_key = %storage_key,
                    "Stored object could not be registered and is orphaned"
                );
                Err(e)
            }
        }
    }
}

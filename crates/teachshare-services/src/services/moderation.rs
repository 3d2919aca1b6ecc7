use std::sync::Arc;

use teachshare_core::models::{ModerationDecision, ModerationState, NewModerationDecision};
use teachshare_core::validation::require_non_empty;
use teachshare_core::AppError;
use teachshare_db::{DocumentRepository, ModerationLog};
use uuid::Uuid;

/// Moderation state machine: `Pending` → `Approved` | `Denied`.
///
/// Every review appends an audit record before the document's state changes.
/// Reviewing a document that was already decided is allowed and logged.
#[derive(Clone)]
pub struct ModerationService {
    documents: Arc<dyn DocumentRepository>,
    log: Arc<dyn ModerationLog>,
}

impl ModerationService {
    pub fn new(documents: Arc<dyn DocumentRepository>, log: Arc<dyn ModerationLog>) -> Self {
        Self { documents, log }
    }

    #[tracing::instrument(skip(self, comments), fields(document_id = %document_id, reviewer_id = %reviewer_id, decision = %decision))]
    pub async fn review(
        &self,
        document_id: Uuid,
        reviewer_id: &str,
        decision: ModerationState,
        comments: &str,
    ) -> Result<ModerationDecision, AppError> {
        let reviewer_id = require_non_empty("reviewer_id", reviewer_id)?;
        if decision == ModerationState::Pending {
            return Err(AppError::InvalidInput(
                "Decision must be approved or denied".to_string(),
            ));
        }

        let document = self
            .documents
            .find_by_id(document_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", document_id)))?;

        if document.moderation_state.is_terminal() {
            tracing::warn!(
                previous_state = %document.moderation_state,
                new_state = %decision,
                "Re-reviewing a document that was already decided"
            );
        }

        let comments = comments.trim().to_string();
        let record = self
            .log
            .record(NewModerationDecision {
                document_id,
                reviewer_id,
                decision,
                comments: comments.clone(),
            })
            .await?;

        let stored_comments = if comments.is_empty() {
            None
        } else {
            Some(comments)
        };
        self.documents
            .update_moderation_state(document_id, decision, stored_comments)
            .await?;

        tracing::info!(
            previous_state = %document.moderation_state,
            "Moderation decision recorded"
        );
        Ok(record)
    }

    /// Audit trail for one document, oldest decision first.
    #[tracing::instrument(skip(self))]
    pub async fn history(&self, document_id: Uuid) -> Result<Vec<ModerationDecision>, AppError> {
        if self.documents.find_by_id(document_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Document {} not found",
                document_id
            )));
        }
        self.log.history(document_id).await
    }
}

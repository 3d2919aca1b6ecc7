use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::ModerationState;

/// Immutable audit record of one reviewer decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationDecision {
    pub id: Uuid,
    pub document_id: Uuid,
    pub reviewer_id: String,
    pub decision: ModerationState,
    pub comments: String,
    pub decided_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewModerationDecision {
    pub document_id: Uuid,
    pub reviewer_id: String,
    pub decision: ModerationState,
    pub comments: String,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user report flagging a document for attention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub id: Uuid,
    pub document_id: Uuid,
    pub reporter_id: String,
    pub reason: String,
    pub reported_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReport {
    pub document_id: Uuid,
    pub reporter_id: String,
    pub reason: String,
}

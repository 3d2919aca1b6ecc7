//! Stored object model: one physical copy of a unique canonical payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fingerprint::ContentFingerprint;

/// A canonical binary registered in the deduplication index.
///
/// Created once per unique fingerprint and never mutated afterwards. Document
/// metadata refers to it through `storage_key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredObject {
    pub fingerprint: ContentFingerprint,
    pub storage_key: String,
    pub bucket: String,
    pub byte_length: i64,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
}

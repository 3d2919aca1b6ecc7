use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::fingerprint::ContentFingerprint;
use crate::validation::normalize_grade;
use crate::AppError;

/// Visibility state of an uploaded document.
///
/// Every document starts `Pending`; reviewers move it to `Approved` or `Denied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "moderation_state", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum ModerationState {
    Pending,
    Approved,
    Denied,
}

impl ModerationState {
    /// Whether a reviewer has already decided on the document.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ModerationState::Pending)
    }
}

impl FromStr for ModerationState {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(ModerationState::Pending),
            "approved" | "approve" => Ok(ModerationState::Approved),
            "denied" | "deny" => Ok(ModerationState::Denied),
            _ => Err(AppError::InvalidInput(format!(
                "Invalid moderation state: {}",
                s
            ))),
        }
    }
}

impl Display for ModerationState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ModerationState::Pending => write!(f, "pending"),
            ModerationState::Approved => write!(f, "approved"),
            ModerationState::Denied => write!(f, "denied"),
        }
    }
}

/// Per-upload metadata record.
///
/// One record exists per upload event, even when the bytes were deduplicated
/// against an earlier upload; such records share a `storage_key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub id: Uuid,
    pub title: String,
    pub subject: String,
    pub grade: String,
    pub owner_id: String,
    pub storage_key: String,
    pub filename: String,
    pub content_type: String,
    pub byte_length: i64,
    pub fingerprint: ContentFingerprint,
    pub moderation_state: ModerationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moderation_comments: Option<String>,
    pub reported: bool,
    pub rating_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentMetadata {
    /// Visible to the public iff approved and not reported.
    pub fn is_publicly_visible(&self) -> bool {
        self.moderation_state == ModerationState::Approved && !self.reported
    }
}

/// Input for creating a document record. Identifiers are minted by the caller.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub id: Uuid,
    pub title: String,
    pub subject: String,
    pub grade: String,
    pub owner_id: String,
    pub storage_key: String,
    pub filename: String,
    pub content_type: String,
    pub byte_length: i64,
    pub fingerprint: ContentFingerprint,
    pub rating_id: Uuid,
}

/// Descriptive fields supplied with an upload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DocumentDetails {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Title must be between 1 and 255 characters"
    ))]
    pub title: String,
    #[validate(length(
        min = 1,
        max = 100,
        message = "Subject must be between 1 and 100 characters"
    ))]
    pub subject: String,
    #[validate(length(
        min = 1,
        max = 32,
        message = "Grade must be between 1 and 32 characters"
    ))]
    pub grade: String,
}

impl DocumentDetails {
    /// Trim and validate the fields. A grade that normalizes to nothing
    /// (e.g. just "Grade") is rejected.
    pub fn new(title: &str, subject: &str, grade: &str) -> Result<Self, AppError> {
        let details = Self {
            title: title.trim().to_string(),
            subject: subject.trim().to_string(),
            grade: grade.trim().to_string(),
        };
        details.validate()?;
        if normalize_grade(&details.grade).is_empty() {
            return Err(AppError::InvalidInput(format!(
                "Grade '{}' does not name a grade",
                details.grade
            )));
        }
        Ok(details)
    }

    /// Grade in the form stored for equality matching.
    pub fn normalized_grade(&self) -> String {
        normalize_grade(&self.grade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_details_trims_and_validates() {
        let details = DocumentDetails::new("  Algebra ", "Maths", "Grade 9").unwrap();
        assert_eq!(details.title, "Algebra");
        assert_eq!(details.normalized_grade(), "9");

        assert!(matches!(
            DocumentDetails::new("   ", "Maths", "9"),
            Err(AppError::InvalidInput(_))
        ));
        assert!(DocumentDetails::new("Algebra", "Maths", "Grade").is_err());
        assert!(DocumentDetails::new(&"x".repeat(256), "Maths", "9").is_err());
    }

    fn test_document(state: ModerationState, reported: bool) -> DocumentMetadata {
        let now = Utc::now();
        DocumentMetadata {
            id: Uuid::new_v4(),
            title: "Photosynthesis".to_string(),
            subject: "Biology".to_string(),
            grade: "10".to_string(),
            owner_id: "educator-1".to_string(),
            storage_key: "documents/abc.pdf".to_string(),
            filename: "notes.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            byte_length: 1024,
            fingerprint: ContentFingerprint::from_digest([7; 32]),
            moderation_state: state,
            moderation_comments: None,
            reported,
            rating_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_public_visibility_requires_approval() {
        assert!(!test_document(ModerationState::Pending, false).is_publicly_visible());
        assert!(!test_document(ModerationState::Denied, false).is_publicly_visible());
        assert!(test_document(ModerationState::Approved, false).is_publicly_visible());
    }

    #[test]
    fn test_reported_document_is_hidden() {
        assert!(!test_document(ModerationState::Approved, true).is_publicly_visible());
    }

    #[test]
    fn test_moderation_state_parsing() {
        assert_eq!(
            "Approved".parse::<ModerationState>().unwrap(),
            ModerationState::Approved
        );
        assert_eq!(
            "deny".parse::<ModerationState>().unwrap(),
            ModerationState::Denied
        );
        assert!("maybe".parse::<ModerationState>().is_err());
        assert!(!ModerationState::Pending.is_terminal());
        assert!(ModerationState::Denied.is_terminal());
    }

    #[test]
    fn test_document_serializes_state_lowercase() {
        let doc = test_document(ModerationState::Pending, false);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["moderation_state"], "pending");
        assert!(json.get("moderation_comments").is_none());
    }
}

//! Identifier and required-field checks applied at the service boundary.

use uuid::Uuid;

use crate::AppError;

/// Parse a document identifier supplied by a caller.
pub fn parse_document_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::InvalidInput(format!("Invalid document ID: {}", raw)))
}

/// Trim `value` and reject it when nothing is left.
pub fn require_non_empty(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

use std::path::Path;

use teachshare_core::AppError;

const MAX_FILENAME_LENGTH: usize = 255;

/// Upload validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Empty file")]
    EmptyFile,
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::FileTooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            _ => AppError::InvalidInput(err.to_string()),
        }
    }
}

/// Checks applied to a raw upload before it is normalized.
#[derive(Debug, Clone)]
pub struct UploadValidator {
    max_file_size: usize,
}

impl UploadValidator {
    pub fn new(max_file_size: usize) -> Self {
        Self { max_file_size }
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Reject declared names carrying control characters.
    ///
    /// An empty name is allowed; it is given a default when the canonical
    /// filename is derived.
    pub fn validate_filename(&self, filename: &str) -> Result<(), ValidationError> {
        if filename.chars().any(char::is_control) {
            return Err(ValidationError::InvalidFilename(
                filename.escape_default().to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_all(&self, filename: &str, size: usize) -> Result<(), ValidationError> {
        self.validate_filename(filename)?;
        self.validate_file_size(size)
    }
}

/// Reduce a declared filename to a safe base name.
///
/// Path components are dropped, characters outside `[A-Za-z0-9._-]` become
/// `_`, and the result is capped at 255 characters. Names that end up empty or
/// contain `..` become `document`.
pub fn sanitize_filename(filename: &str) -> String {
    let base = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    if base.contains("..") {
        return "document".to_string();
    }

    let sanitized: String = base
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches(|c| c == '_' || c == '.').is_empty() {
        "document".to_string()
    } else {
        sanitized
    }
}

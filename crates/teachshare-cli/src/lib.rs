use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use teachshare_core::models::{DocumentMetadata, RatingAggregate};
use teachshare_core::{AppError, ErrorMetadata, LogLevel};

const DEFAULT_FILTER: &str = "teachshare=info,sqlx=warn";

/// Initialize tracing for CLI binaries.
///
/// Logs go to stderr so stdout carries only command output.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Read a file to upload, returning its bytes and base name.
pub fn read_upload(path: &Path) -> anyhow::Result<(Vec<u8>, String)> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    Ok((bytes, filename))
}

/// A document together with its rating, as printed by `show`.
#[derive(Debug, Serialize)]
pub struct DocumentView {
    #[serde(flatten)]
    pub document: DocumentMetadata,
    pub rating: RatingAggregate,
}

/// Error body printed to stderr when a command fails.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    pub code: String,
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

impl ErrorResponse {
    /// Sensitive errors, and every error in production, carry only the client message.
    pub fn from_app_error(error: &AppError, is_production: bool) -> Self {
        let (details, error_type) = if is_production || error.is_sensitive() {
            (None, None)
        } else {
            (
                Some(error.detailed_message()),
                Some(error.error_type().to_string()),
            )
        };
        Self {
            error: error.client_message(),
            details,
            error_type,
            code: error.error_code().to_string(),
            recoverable: error.is_recoverable(),
            suggested_action: error.suggested_action().map(String::from),
        }
    }
}

pub fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Command failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Command failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error.detailed_message(), error_type = error_type, "Command failed");
        }
    }
}

//! Format normalization: every stored document is a PDF.

use std::path::Path;

use teachshare_core::AppError;

use crate::detect::{detect_content_type, is_line_oriented, looks_like_text, PDF_MIME};
use crate::pdf::TextPdfRenderer;
use crate::validator::sanitize_filename;

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("Cannot convert {content_type} content to PDF")]
    UnsupportedInputKind { content_type: String },

    #[error("PDF rendering failed: {0}")]
    Render(String),
}

impl From<NormalizeError> for AppError {
    fn from(err: NormalizeError) -> Self {
        match err {
            NormalizeError::UnsupportedInputKind { .. } => {
                AppError::UnsupportedInputKind(err.to_string())
            }
            NormalizeError::Render(msg) => AppError::Internal(msg),
        }
    }
}

/// Result of normalizing one upload.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDocument {
    /// Canonical bytes; this is what gets fingerprinted and stored.
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: String,
    /// Type detected for the raw upload.
    pub source_type: String,
    /// Set when the input was rendered rather than passed through.
    pub page_count: Option<usize>,
}

impl NormalizedDocument {
    pub fn was_converted(&self) -> bool {
        self.page_count.is_some()
    }
}

/// Converts uploads into the canonical PDF form.
///
/// PDFs pass through untouched, so normalizing a normalized document is the
/// identity. Line-oriented text is re-rendered page by page. Everything else
/// is rejected.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    renderer: TextPdfRenderer,
}

impl Normalizer {
    pub fn new(renderer: TextPdfRenderer) -> Self {
        Self { renderer }
    }

    pub fn normalize(
        &self,
        bytes: Vec<u8>,
        declared_filename: &str,
        declared_type: Option<&str>,
    ) -> Result<NormalizedDocument, NormalizeError> {
        let source_type = detect_content_type(&bytes, declared_filename, declared_type);

        if source_type == PDF_MIME && bytes.starts_with(b"%PDF") {
            tracing::debug!(filename = %declared_filename, "Input already canonical");
            return Ok(NormalizedDocument {
                bytes,
                filename: passthrough_filename(declared_filename),
                content_type: PDF_MIME.to_string(),
                source_type,
                page_count: None,
            });
        }

        if !is_line_oriented(&source_type) && !looks_like_text(&bytes) {
            tracing::debug!(
                filename = %declared_filename,
                content_type = %source_type,
                "Input is neither PDF nor text"
            );
            return Err(NormalizeError::UnsupportedInputKind {
                content_type: source_type,
            });
        }

        let text = String::from_utf8_lossy(&bytes);
        let (pdf, pages) = self
            .renderer
            .render(&text)
            .map_err(|e| NormalizeError::Render(e.to_string()))?;

        tracing::debug!(
            filename = %declared_filename,
            source_type = %source_type,
            input_bytes = bytes.len(),
            output_bytes = pdf.len(),
            pages,
            "Rendered text input to PDF"
        );

        Ok(NormalizedDocument {
            bytes: pdf,
            filename: canonical_filename(declared_filename),
            content_type: PDF_MIME.to_string(),
            source_type,
            page_count: Some(pages),
        })
    }
}

/// Declared base name with its extension replaced by `.pdf`.
pub fn canonical_filename(declared: &str) -> String {
    let safe = sanitize_filename(declared);
    let stem = Path::new(&safe)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("document");
    format!("{}.pdf", stem)
}

fn passthrough_filename(declared: &str) -> String {
    let safe = sanitize_filename(declared);
    if safe.to_lowercase().ends_with(".pdf") {
        safe
    } else {
        canonical_filename(declared)
    }
}

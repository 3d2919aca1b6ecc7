//! TeachShare document processing
//!
//! CPU-bound steps of the ingestion pipeline: upload validation, content type
//! detection, normalization to PDF, and content fingerprinting. Nothing in this
//! crate performs I/O.

pub mod detect;
pub mod hasher;
pub mod normalizer;
pub mod pdf;
pub mod validator;

pub use detect::{detect_content_type, is_line_oriented, mime_for_extension};
pub use hasher::fingerprint;
pub use normalizer::{canonical_filename, NormalizeError, NormalizedDocument, Normalizer};
pub use pdf::{PageLayout, TextPdfRenderer};
pub use validator::{sanitize_filename, UploadValidator, ValidationError};

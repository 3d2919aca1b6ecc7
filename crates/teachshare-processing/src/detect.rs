//! Content type detection: magic bytes first, then the filename extension.

use std::path::Path;

pub const PDF_MIME: &str = "application/pdf";
pub const OCTET_STREAM_MIME: &str = "application/octet-stream";

/// Detect the content type of an upload.
///
/// Resolution order: content sniffing, the declared filename's extension, the
/// caller-declared type, and finally `application/octet-stream`.
pub fn detect_content_type(bytes: &[u8], filename: &str, declared: Option<&str>) -> String {
    if let Some(kind) = infer::get(bytes) {
        return kind.mime_type().to_string();
    }

    if let Some(mime) = extension_of(filename).and_then(|ext| mime_for_extension(&ext)) {
        return mime.to_string();
    }

    declared
        .map(|ct| ct.trim().to_lowercase())
        .filter(|ct| !ct.is_empty())
        .unwrap_or_else(|| OCTET_STREAM_MIME.to_string())
}

fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Map a lower-case file extension to its MIME type.
pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
    let mime = match extension {
        // Canonical
        "pdf" => PDF_MIME,
        // Line-oriented text
        "txt" | "text" | "log" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "csv" => "text/csv",
        "tsv" => "text/tab-separated-values",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "xml" => "application/xml",
        "json" => "application/json",
        "js" => "application/javascript",
        "sh" => "application/x-sh",
        "yaml" | "yml" => "application/x-yaml",
        "toml" => "application/toml",
        "py" => "text/x-python",
        "java" => "text/x-java-source",
        "c" | "h" => "text/x-c",
        "tex" => "application/x-tex",
        "rtf" => "application/rtf",
        // Office formats (not convertible)
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        // Media and archives (not convertible)
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        _ => return None,
    };
    Some(mime)
}

/// Whether content of this type can be re-rendered line by line.
pub fn is_line_oriented(content_type: &str) -> bool {
    let ct = content_type.to_lowercase();
    ct.starts_with("text/")
        || matches!(
            ct.as_str(),
            "application/json"
                | "application/xml"
                | "application/javascript"
                | "application/x-sh"
                | "application/x-shellscript"
                | "application/x-yaml"
                | "application/toml"
                | "application/x-tex"
                | "application/rtf"
        )
}

/// Whether the bytes are plausibly text regardless of the detected type.
pub(crate) fn looks_like_text(bytes: &[u8]) -> bool {
    !bytes.contains(&0) && std::str::from_utf8(bytes).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn test_magic_bytes_win_over_extension() {
        assert_eq!(detect_content_type(b"%PDF-1.7\n", "notes.txt", None), PDF_MIME);
        assert_eq!(detect_content_type(PNG_HEADER, "notes.txt", None), "image/png");
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(detect_content_type(b"Line1\nLine2", "notes.txt", None), "text/plain");
        assert_eq!(detect_content_type(b"a,b\n1,2", "DATA.CSV", None), "text/csv");
    }

    #[test]
    fn test_declared_then_octet_stream_fallback() {
        assert_eq!(
            detect_content_type(b"plain words", "README", Some("Text/Plain")),
            "text/plain"
        );
        assert_eq!(detect_content_type(b"plain words", "README", None), OCTET_STREAM_MIME);
    }

    #[test]
    fn test_line_oriented_types() {
        assert!(is_line_oriented("text/plain"));
        assert!(is_line_oriented("application/json"));
        assert!(!is_line_oriented("image/png"));
        assert!(!is_line_oriented(OCTET_STREAM_MIME));
    }

    #[test]
    fn test_looks_like_text() {
        assert!(looks_like_text("Grüße\n".as_bytes()));
        assert!(!looks_like_text(&[0x66, 0x00, 0x67]));
        assert!(!looks_like_text(&[0xff, 0xfe, 0xfd]));
    }
}

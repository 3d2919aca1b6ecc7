//! Shared key generation for storage backends.
//!
//! Key format: `documents/{uuid}.{extension}`.

use uuid::Uuid;

/// Mint a fresh storage key for a canonical document.
///
/// The UUID is independent of any database primary key, so two uploads never
/// collide on a key even when they carry identical metadata.
pub fn generate_document_key(extension: &str) -> String {
    let extension = extension.trim_start_matches('.');
    if extension.is_empty() {
        format!("documents/{}", Uuid::new_v4())
    } else {
        format!("documents/{}.{}", Uuid::new_v4(), extension.to_lowercase())
    }
}

/// Reject keys that could escape a backend's namespace.
pub(crate) fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && !key.contains("..") && !key.starts_with('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_fresh_and_scoped() {
        let a = generate_document_key("pdf");
        let b = generate_document_key(".PDF");
        assert!(a.starts_with("documents/") && a.ends_with(".pdf"));
        assert!(b.ends_with(".pdf"));
        assert_ne!(a, b);
        assert!(is_valid_key(&a));
    }

    #[test]
    fn test_invalid_keys() {
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("../etc/passwd"));
        assert!(!is_valid_key("/abs/path"));
    }
}

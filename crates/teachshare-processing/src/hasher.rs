//! Content fingerprinting.

use sha2::{Digest, Sha256};
use teachshare_core::models::ContentFingerprint;

/// SHA-256 fingerprint of canonical document bytes.
///
/// Pure and deterministic. Must be computed over the normalized bytes, never
/// the raw upload, so that identical canonical content deduplicates.
pub fn fingerprint(bytes: &[u8]) -> ContentFingerprint {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    ContentFingerprint::from_digest(hasher.finalize().into())
}

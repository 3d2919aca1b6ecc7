use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::AppError;

/// Length of a SHA-256 digest in bytes.
pub const FINGERPRINT_LEN: usize = 32;

/// SHA-256 digest of a document's canonical bytes.
///
/// This is the sole identity used for deduplication: identical canonical
/// content always yields an identical fingerprint. Rendered as 64 lowercase
/// hex characters everywhere it leaves the process.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentFingerprint([u8; FINGERPRINT_LEN]);

impl ContentFingerprint {
    pub fn from_digest(digest: [u8; FINGERPRINT_LEN]) -> Self {
        Self(digest)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Display for ContentFingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.to_hex())
    }
}

impl std::fmt::Debug for ContentFingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "ContentFingerprint({})", self.to_hex())
    }
}

impl FromStr for ContentFingerprint {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != FINGERPRINT_LEN * 2 {
            return Err(AppError::InvalidInput(format!(
                "fingerprint must be {} hex characters, got {}",
                FINGERPRINT_LEN * 2,
                s.len()
            )));
        }
        let mut digest = [0u8; FINGERPRINT_LEN];
        hex::decode_to_slice(s, &mut digest)
            .map_err(|e| AppError::InvalidInput(format!("invalid fingerprint: {}", e)))?;
        Ok(Self(digest))
    }
}

impl TryFrom<String> for ContentFingerprint {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ContentFingerprint> for String {
    fn from(fingerprint: ContentFingerprint) -> Self {
        fingerprint.to_hex()
    }
}

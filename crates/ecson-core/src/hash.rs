//! Content hashing for deterministic compile verification.
//!
//! Produces a SHA-256 hash of a JSON value's serialized bytes, so two
//! compiles of the same document can be compared without keeping both IRs.

use sha2::{Digest, Sha256};

use crate::error::EcsonResult;

/// A content hash digest (SHA-256, 32 bytes).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash {
    bytes: [u8; 32],
}

impl ContentHash {
    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Hash raw bytes.
pub fn hash_bytes(data: &[u8]) -> ContentHash {
    let result = Sha256::digest(data);
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&result);
    ContentHash::from_bytes(bytes)
}

/// Hash any serializable value through its compact JSON form.
///
/// Map key order must be deterministic in `value` for the hash to be stable.
pub fn hash_json<T: serde::Serialize>(value: &T) -> EcsonResult<ContentHash> {
    let bytes = serde_json::to_vec(value)?;
    Ok(hash_bytes(&bytes))
}

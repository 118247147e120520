//! Integrity hash conversion
//!
//! PyPI publishes hex-encoded SHA-256 digests; Nix expects SRI hashes
//! (`sha256-<base64>`).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Nix expression used when no real hash could be resolved
pub const FALLBACK_HASH: &str = "pkgs.lib.fakeHash";

/// SRI algorithm prefix
const SRI_ALGORITHM: &str = "sha256";

/// Errors that can occur while converting digests
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HashError {
    /// Digest is not valid hexadecimal
    #[error("Malformed digest {digest:?}: {reason}")]
    MalformedDigest { digest: String, reason: String },
}

/// A decoded SHA-256 content digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityHash {
    bytes: Vec<u8>,
}

impl IntegrityHash {
    /// Decode a hex digest
    pub fn from_hex(digest: &str) -> Result<Self, HashError> {
        if digest.is_empty() {
            return Err(HashError::MalformedDigest {
                digest: String::new(),
                reason: "empty digest".to_string(),
            });
        }
        let bytes = hex::decode(digest).map_err(|e| HashError::MalformedDigest {
            digest: digest.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { bytes })
    }

    /// Lowercase hex form of the digest
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Base64 fragment (the part after `sha256-`)
    pub fn fragment(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Quoted SRI literal ready to embed in a Nix expression
    pub fn expression(&self) -> String {
        format!("\"{}-{}\"", SRI_ALGORITHM, self.fragment())
    }
}

/// Convert a hex digest into the base64 fragment of an SRI hash
pub fn sri_fragment(digest: &str) -> Result<String, HashError> {
    IntegrityHash::from_hex(digest).map(|h| h.fragment())
}

/// Compute the hex SHA-256 of a byte slice
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

// crates/reelgate-core/src/core/hashing.rs
// ============================================================================
// Module: Reelgate Content Hashing
// Description: Streaming file digests and RFC 8785 JSON canonicalization.
// Purpose: Provide the integrity primitive shared by manifests and verifiers.
// Dependencies: serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Every artifact Reelgate copies or verifies is identified by its byte size
//! and lowercase hex SHA-256 digest. Files are streamed in fixed 1 MiB chunks
//! so memory use stays bounded regardless of file size. Manifests are written
//! as RFC 8785 (JCS) canonical JSON so their own digests are stable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::ErrorKind as IoErrorKind;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Chunk size used when streaming file contents into the hasher.
pub const HASH_CHUNK_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: Hash Algorithm
// ============================================================================

/// Supported hash algorithms for Reelgate manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256 hashing.
    Sha256,
}

impl HashAlgorithm {
    /// Returns the manifest label for the algorithm.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }

    /// Parses a manifest label, returning `None` for unsupported algorithms.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "sha256" => Some(Self::Sha256),
            _ => None,
        }
    }
}

/// Default hash algorithm for Reelgate.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

// ============================================================================
// SECTION: File Digest
// ============================================================================

/// Size and content digest of a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDigest {
    /// File size in bytes.
    pub size: u64,
    /// Lowercase hex-encoded SHA-256 digest.
    pub sha256: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when computing hashes.
#[derive(Debug, Error)]
pub enum HashError {
    /// The file does not exist.
    #[error("file not found: {0}")]
    NotFound(String),
    /// Reading the file failed.
    #[error("failed to read {path}: {message}")]
    Io {
        /// Path being hashed.
        path: String,
        /// Underlying I/O error message.
        message: String,
    },
    /// JSON canonicalization failed.
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
}

// ============================================================================
// SECTION: Hashing Helpers
// ============================================================================

/// Streams a file through SHA-256 and returns its size and digest.
///
/// # Errors
///
/// Returns [`HashError::NotFound`] when the file is missing and
/// [`HashError::Io`] for any other read failure.
pub fn digest_file(path: &Path) -> Result<FileDigest, HashError> {
    let mut file = File::open(path).map_err(|err| io_error(path, &err))?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0_u8; HASH_CHUNK_BYTES];
    let mut size: u64 = 0;
    loop {
        let read = file.read(&mut buffer).map_err(|err| io_error(path, &err))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
        size = size.saturating_add(read as u64);
    }
    Ok(FileDigest {
        size,
        sha256: hex_encode(&hasher.finalize()),
    })
}

/// Hashes raw bytes and returns the lowercase hex digest.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex_encode(&hasher.finalize())
}

/// Returns canonical JSON bytes for a serializable value using RFC 8785.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}

/// Returns true when two hex digests name the same content.
#[must_use]
pub fn digests_match(expected: &str, actual: &str) -> bool {
    expected.trim().eq_ignore_ascii_case(actual)
}

/// Maps an I/O failure into a [`HashError`].
fn io_error(path: &Path, err: &std::io::Error) -> HashError {
    if err.kind() == IoErrorKind::NotFound {
        return HashError::NotFound(path.display().to_string());
    }
    HashError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use std::io::Write;

    use super::*;

    #[test]
    fn hash_bytes_matches_known_vector() {
        assert_eq!(
            hash_bytes(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn digest_file_streams_across_chunk_boundary() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let payload = vec![7_u8; HASH_CHUNK_BYTES + 17];
        file.write_all(&payload).unwrap();
        file.flush().unwrap();

        let digest = digest_file(file.path()).unwrap();
        assert_eq!(digest.size, payload.len() as u64);
        assert_eq!(digest.sha256, hash_bytes(&payload));
    }

    #[test]
    fn digest_file_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = digest_file(&dir.path().join("absent.bin")).unwrap_err();
        assert!(matches!(err, HashError::NotFound(_)));
    }

    #[test]
    fn canonical_json_sorts_keys() {
        let value = serde_json::json!({"b": 1, "a": 2});
        let bytes = canonical_json_bytes(&value).unwrap();
        assert_eq!(bytes, br#"{"a":2,"b":1}"#);
    }

    #[test]
    fn digests_match_ignores_case() {
        assert!(digests_match("ABCDEF", "abcdef"));
        assert!(!digests_match("abcdee", "abcdef"));
    }
}

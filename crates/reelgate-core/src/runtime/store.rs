// crates/reelgate-core/src/runtime/store.rs
// ============================================================================
// Module: Reelgate State Document Stores
// Description: File-backed and in-memory state document stores.
// Purpose: Persist the whole document per mutation with atomic replacement.
// Dependencies: crate::{core, interfaces}, serde_json
// ============================================================================

//! ## Overview
//! The file store reads the whole document, and writes it back as pretty
//! JSON through a temp file and rename in the same directory. There is no
//! in-process lock; each invocation is expected to be the sole writer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::core::error::PipelineError;
use crate::core::shot::StateDocument;
use crate::interfaces::StateDocumentStore;
use crate::interfaces::StoreError;
use crate::runtime::files::MAX_STATE_DOCUMENT_BYTES;
use crate::runtime::files::read_bytes_with_limit;
use crate::runtime::files::write_atomic;

// ============================================================================
// SECTION: File Store
// ============================================================================

/// State document stored as a JSON file.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    /// Path of the document.
    path: PathBuf,
    /// Directory holding the document.
    base_dir: PathBuf,
}

impl FileStateStore {
    /// Creates a store for the document at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let base_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self {
            path,
            base_dir,
        }
    }

    /// Returns the document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateDocumentStore for FileStateStore {
    fn load(&self) -> Result<StateDocument, StoreError> {
        let bytes = read_bytes_with_limit(&self.path, MAX_STATE_DOCUMENT_BYTES).map_err(|err| {
            match err {
                PipelineError::NotFound(message) => StoreError::NotFound(message),
                PipelineError::Invalid(message) => StoreError::Invalid(message),
                other => StoreError::Io(other.to_string()),
            }
        })?;
        let document: StateDocument = serde_json::from_slice(&bytes).map_err(|err| {
            StoreError::Invalid(format!("{}: {err}", self.path.display()))
        })?;
        document.validate_keys().map_err(|err| StoreError::Invalid(err.to_string()))?;
        Ok(document)
    }

    fn save(&self, document: &StateDocument) -> Result<(), StoreError> {
        let mut bytes = serde_json::to_vec_pretty(document)
            .map_err(|err| StoreError::Invalid(err.to_string()))?;
        bytes.push(b'\n');
        write_atomic(&self.path, &bytes).map_err(|err| StoreError::Io(err.to_string()))
    }

    fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory store for tests and embedding.
#[derive(Debug)]
pub struct InMemoryStateStore {
    /// Current document.
    document: Mutex<StateDocument>,
    /// Directory that output paths resolve against.
    base_dir: PathBuf,
}

impl InMemoryStateStore {
    /// Creates a store seeded with `document`.
    #[must_use]
    pub fn new(document: StateDocument, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            document: Mutex::new(document),
            base_dir: base_dir.into(),
        }
    }
}

impl StateDocumentStore for InMemoryStateStore {
    fn load(&self) -> Result<StateDocument, StoreError> {
        self.document
            .lock()
            .map(|document| document.clone())
            .map_err(|_| StoreError::Io("state document mutex poisoned".to_string()))
    }

    fn save(&self, document: &StateDocument) -> Result<(), StoreError> {
        let mut guard = self
            .document
            .lock()
            .map_err(|_| StoreError::Io("state document mutex poisoned".to_string()))?;
        *guard = document.clone();
        Ok(())
    }

    fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use super::*;
    use crate::core::identifiers::ShotId;
    use crate::core::shot::Shot;
    use crate::core::time::UtcTimestamp;

    #[test]
    fn file_store_round_trips_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path().join("state.json"));
        let at = UtcTimestamp::from_unix_seconds(60).unwrap();
        let mut doc = StateDocument::new("demo", at);
        doc.shots.insert(
            "SH001".to_string(),
            Shot::planned(ShotId::new("SH001"), "FAZ_1", "a", at, "tester"),
        );
        store.save(&doc).unwrap();
        assert_eq!(store.load().unwrap(), doc);
        assert_eq!(store.base_dir(), dir.path());
    }

    #[test]
    fn file_store_reports_missing_and_malformed_documents() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path().join("state.json"));
        assert!(matches!(store.load(), Err(StoreError::NotFound(_))));
        std::fs::write(store.path(), b"{not json").unwrap();
        assert!(matches!(store.load(), Err(StoreError::Invalid(_))));
    }
}

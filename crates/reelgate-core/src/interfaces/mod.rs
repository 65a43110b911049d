// crates/reelgate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Reelgate Interfaces
// Description: Backend-agnostic seams for storage, QC schemas, gating, and audit.
// Purpose: Define the contract surfaces used by the Reelgate runtime.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Interfaces decouple the runtime from where the state document lives, how
//! QC reports are schema-checked, how releases are gated, and where audit
//! events go. Implementations must be deterministic and fail closed on missing
//! or invalid data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use crate::core::audit::AuditEvent;
use crate::core::error::PipelineError;
use crate::core::identifiers::ProjectId;
use crate::core::identifiers::ReleaseId;
use crate::core::shot::StateDocument;
use crate::core::time::UtcTimestamp;

// ============================================================================
// SECTION: State Document Store
// ============================================================================

/// State document store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The document does not exist.
    #[error("state document not found: {0}")]
    NotFound(String),
    /// Store I/O error.
    #[error("state document io error: {0}")]
    Io(String),
    /// Document contents are invalid.
    #[error("state document invalid: {0}")]
    Invalid(String),
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(message) => Self::NotFound(message),
            StoreError::Io(message) => Self::Io(message),
            StoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

/// Whole-document persistence for the state tracker.
///
/// # Invariants
/// - `save` replaces the document atomically; readers never see a partial write.
pub trait StateDocumentStore {
    /// Loads the full document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the document cannot be read or parsed.
    fn load(&self) -> Result<StateDocument, StoreError>;

    /// Persists the full document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the document cannot be written.
    fn save(&self, document: &StateDocument) -> Result<(), StoreError>;

    /// Directory that output paths in the document are relative to.
    fn base_dir(&self) -> &Path;
}

// ============================================================================
// SECTION: QC Report Validation
// ============================================================================

/// Schema check applied to a parsed QC report before its fields are read.
pub trait QcReportValidator {
    /// Validates a QC report.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the report violates its schema.
    fn validate(&self, report: &Value) -> Result<(), String>;
}

impl<T: QcReportValidator + ?Sized> QcReportValidator for &T {
    fn validate(&self, report: &Value) -> Result<(), String> {
        (**self).validate(report)
    }
}

// ============================================================================
// SECTION: Release Gate
// ============================================================================

/// Gate consulted before shots are promoted into a release.
pub trait ReleaseGate {
    /// Checks that a release may receive promoted shots.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] describing the first blocking failure.
    fn check(
        &self,
        project_id: &ProjectId,
        release_id: &ReleaseId,
        at: UtcTimestamp,
    ) -> Result<(), PipelineError>;
}

impl<T: ReleaseGate + ?Sized> ReleaseGate for &T {
    fn check(
        &self,
        project_id: &ProjectId,
        release_id: &ReleaseId,
        at: UtcTimestamp,
    ) -> Result<(), PipelineError> {
        (**self).check(project_id, release_id, at)
    }
}

// ============================================================================
// SECTION: Audit Sink
// ============================================================================

/// Destination for audit events.
pub trait AuditSink: Send + Sync {
    /// Records an audit event.
    fn record(&self, event: &AuditEvent);
}

impl<T: AuditSink + ?Sized> AuditSink for &T {
    fn record(&self, event: &AuditEvent) {
        (**self).record(event);
    }
}

impl<T: AuditSink + ?Sized> AuditSink for Box<T> {
    fn record(&self, event: &AuditEvent) {
        (**self).record(event);
    }
}

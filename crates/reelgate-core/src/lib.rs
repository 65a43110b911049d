// crates/reelgate-core/src/lib.rs
// ============================================================================
// Module: Reelgate Core
// Description: Shot lifecycle, manifest integrity, policy gate, and bundling.
// Purpose: Provide the deterministic engine behind the `reelgate` CLI.
// Dependencies: serde, serde_json, serde_jcs, sha2, tempfile, thiserror, time
// ============================================================================

//! ## Overview
//! Reelgate core tracks production shots through a guarded lifecycle and turns
//! finished work into content-addressed, tamper-evident releases.
//!
//! - [`core`] holds the persisted data model and integrity primitives.
//! - [`interfaces`] declares the seams for storage, QC validation, the
//!   release gate, and audit output.
//! - [`runtime`] implements the operations on top of the filesystem.
//!
//! Invariants:
//! - A rejected operation leaves every file it would have touched unchanged.
//! - Manifests and releases are write-once; existing targets are refused.
//! - Timestamps are always supplied by the caller.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::ARTIFACT_LIST_MANIFEST_VERSION;
pub use crate::core::ArtifactEntry;
pub use crate::core::ArtifactListManifest;
pub use crate::core::AuditEvent;
pub use crate::core::ConflictPolicy;
pub use crate::core::DEFAULT_HASH_ALGORITHM;
pub use crate::core::ErrorKind;
pub use crate::core::FILE_LIST_MANIFEST_VERSION;
pub use crate::core::FileDigest;
pub use crate::core::FileListManifest;
pub use crate::core::HashAlgorithm;
pub use crate::core::HashError;
pub use crate::core::HistoryEntry;
pub use crate::core::HistoryEventKind;
pub use crate::core::Manifest;
pub use crate::core::MANIFEST_FILE_NAME;
pub use crate::core::ManifestKind;
pub use crate::core::ManifestTotals;
pub use crate::core::PathError;
pub use crate::core::PipelineError;
pub use crate::core::PREVIEW_OUTPUT_KEY;
pub use crate::core::PROJECT_FILE_NAME;
pub use crate::core::ProjectFile;
pub use crate::core::ProjectId;
pub use crate::core::ProjectPolicy;
pub use crate::core::QC_OUTPUT_KEY;
pub use crate::core::QcPolicy;
pub use crate::core::ReleaseId;
pub use crate::core::Shot;
pub use crate::core::ShotFileEntry;
pub use crate::core::ShotFiles;
pub use crate::core::ShotId;
pub use crate::core::ShotStatus;
pub use crate::core::SourceRecord;
pub use crate::core::StateDocument;
pub use crate::core::UtcTimestamp;
pub use crate::interfaces::AuditSink;
pub use crate::interfaces::QcReportValidator;
pub use crate::interfaces::ReleaseGate;
pub use crate::interfaces::StateDocumentStore;
pub use crate::interfaces::StoreError;
pub use crate::runtime::AttachOutputRequest;
pub use crate::runtime::BuiltRelease;
pub use crate::runtime::BundleMerger;
pub use crate::runtime::BundleRequest;
pub use crate::runtime::FileAuditSink;
pub use crate::runtime::FileStateStore;
pub use crate::runtime::GateLayout;
pub use crate::runtime::GateReport;
pub use crate::runtime::GateRequest;
pub use crate::runtime::InMemoryStateStore;
pub use crate::runtime::ManifestVerifier;
pub use crate::runtime::MemoryAuditSink;
pub use crate::runtime::NewShotRequest;
pub use crate::runtime::NoopAuditSink;
pub use crate::runtime::PolicyGate;
pub use crate::runtime::PromoteOutcome;
pub use crate::runtime::PromoteRequest;
pub use crate::runtime::PromoteSelection;
pub use crate::runtime::ReleaseBuilder;
pub use crate::runtime::ReleaseRequest;
pub use crate::runtime::RenderRequest;
pub use crate::runtime::ShotFilter;
pub use crate::runtime::ShotListing;
pub use crate::runtime::ShotStateMachine;
pub use crate::runtime::ShotTracker;
pub use crate::runtime::StderrAuditSink;
pub use crate::runtime::StructuralQcValidator;
pub use crate::runtime::TransitionOutcome;
pub use crate::runtime::TransitionRequest;
pub use crate::runtime::VerificationReport;

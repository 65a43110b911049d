// crates/reelgate-core/src/core/mod.rs
// ============================================================================
// Module: Reelgate Core Types
// Description: Canonical shot, manifest, and policy structures.
// Purpose: Provide stable, serializable types for the production pipeline.
// Dependencies: serde, serde_json, sha2, time
// ============================================================================

//! ## Overview
//! Reelgate core types define the persisted state document, the two manifest
//! generations, project policy, and the integrity primitives shared by every
//! operation. These types are the canonical source of truth for the JSON
//! files the CLI reads and writes.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod error;
pub mod hashing;
pub mod identifiers;
pub mod manifest;
pub mod paths;
pub mod policy;
pub mod shot;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditEvent;
pub use error::ErrorKind;
pub use error::PipelineError;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::FileDigest;
pub use hashing::HashAlgorithm;
pub use hashing::HashError;
pub use identifiers::ProjectId;
pub use identifiers::ReleaseId;
pub use identifiers::ShotId;
pub use manifest::ARTIFACT_LIST_MANIFEST_VERSION;
pub use manifest::ArtifactEntry;
pub use manifest::ArtifactListManifest;
pub use manifest::ArtifactView;
pub use manifest::ConflictPolicy;
pub use manifest::FILE_LIST_MANIFEST_VERSION;
pub use manifest::FileListManifest;
pub use manifest::MANIFEST_FILE_NAME;
pub use manifest::Manifest;
pub use manifest::ManifestFormatError;
pub use manifest::ManifestKind;
pub use manifest::ManifestTotals;
pub use manifest::ShotFileEntry;
pub use manifest::ShotFiles;
pub use manifest::SourceRecord;
pub use paths::PathError;
pub use policy::PROJECT_FILE_NAME;
pub use policy::ProjectFile;
pub use policy::ProjectPolicy;
pub use policy::QcPolicy;
pub use shot::HistoryEntry;
pub use shot::HistoryEventKind;
pub use shot::PREVIEW_OUTPUT_KEY;
pub use shot::QC_OUTPUT_KEY;
pub use shot::Shot;
pub use shot::ShotStatus;
pub use shot::StateDocument;
pub use time::TimestampError;
pub use time::UtcTimestamp;

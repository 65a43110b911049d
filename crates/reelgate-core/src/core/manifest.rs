// crates/reelgate-core/src/core/manifest.rs
// ============================================================================
// Module: Reelgate Manifest Model
// Description: Release and bundle manifests in their two supported generations.
// Purpose: Describe the content-addressed inventory written beside every release.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Manifests come in two generations, keyed by `manifest_version`:
//! - **File list** (version 1): artifacts grouped per shot, paths relative to
//!   the directory holding `manifest.json`. Releases and bundles use this form.
//! - **Artifact list** (version 2): a flat `{path, size, sha256}` list whose
//!   paths are relative to a caller-supplied project root.
//!
//! Any other version is rejected as unsupported. Manifests are write-once and
//! serialized as canonical JSON.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::ProjectId;
use crate::core::identifiers::ReleaseId;
use crate::core::identifiers::ShotId;
use crate::core::time::UtcTimestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// File name of a manifest inside a release or bundle directory.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";
/// Version tag of the shot-grouped file-list generation.
pub const FILE_LIST_MANIFEST_VERSION: u64 = 1;
/// Version tag of the flat artifact-list generation.
pub const ARTIFACT_LIST_MANIFEST_VERSION: u64 = 2;

// ============================================================================
// SECTION: Shared Types
// ============================================================================

/// What produced a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestKind {
    /// Built from DONE shots of a state document.
    #[default]
    Release,
    /// Merged from existing releases.
    Bundle,
}

/// Summary totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ManifestTotals {
    /// Number of shots contributing artifacts.
    pub total_shots: u64,
    /// Number of artifacts.
    pub total_files: u64,
    /// Sum of artifact sizes.
    pub total_bytes: u64,
}

/// Resolution strategy for a shot claimed by more than one bundle source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Abort the bundle.
    #[default]
    Fail,
    /// Keep the source with the later `created_utc`; ties keep the first seen.
    Latest,
}

impl ConflictPolicy {
    /// Returns the stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fail => "fail",
            Self::Latest => "latest",
        }
    }

    /// Parses a label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim() {
            "fail" => Some(Self::Fail),
            "latest" => Some(Self::Latest),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: File-List Generation
// ============================================================================

/// One copied artifact of a shot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotFileEntry {
    /// Output key the artifact was recorded under.
    pub key: String,
    /// Where the artifact came from before the copy.
    pub source: String,
    /// Path relative to the manifest directory.
    pub path: String,
    /// Destination path relative to the manifest directory.
    pub dest: String,
    /// Size in bytes measured at the destination.
    pub bytes: u64,
    /// SHA-256 measured at the destination.
    pub sha256: String,
}

/// Artifacts grouped under one shot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotFiles {
    /// Shot identifier.
    pub shot_id: ShotId,
    /// Phase the shot was in when released.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    /// Artifacts in key order.
    #[serde(default)]
    pub files: Vec<ShotFileEntry>,
}

/// Provenance of one bundle input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Release identifier of the source.
    pub source_release_id: ReleaseId,
    /// SHA-256 of the source `manifest.json` bytes.
    pub source_manifest_hash: String,
    /// Source directory as given by the caller.
    pub source_path: String,
    /// Creation time of the source release.
    pub created_utc: UtcTimestamp,
}

/// Shot-grouped manifest (version 1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileListManifest {
    /// Always [`FILE_LIST_MANIFEST_VERSION`].
    pub manifest_version: u64,
    /// Release or bundle.
    #[serde(default)]
    pub kind: ManifestKind,
    /// Digest algorithm label.
    pub hash_alg: String,
    /// Release or bundle identifier.
    pub release_id: ReleaseId,
    /// Project the release belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    /// Creation time.
    pub created_utc: UtcTimestamp,
    /// Shots in identifier order.
    pub shots: Vec<ShotFiles>,
    /// Bundle provenance, empty for releases.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceRecord>,
    /// Summary totals.
    #[serde(default)]
    pub totals: ManifestTotals,
}

// ============================================================================
// SECTION: Artifact-List Generation
// ============================================================================

/// One artifact of a flat manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    /// Path relative to the project root.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
    /// SHA-256 digest.
    pub sha256: String,
}

/// Flat manifest (version 2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactListManifest {
    /// Always [`ARTIFACT_LIST_MANIFEST_VERSION`].
    pub manifest_version: u64,
    /// Release or bundle.
    #[serde(default)]
    pub kind: ManifestKind,
    /// Digest algorithm label.
    pub hash_alg: String,
    /// Release identifier.
    pub release_id: ReleaseId,
    /// Project the release belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    /// Creation time.
    pub created_utc: UtcTimestamp,
    /// Artifacts in path order.
    pub artifacts: Vec<ArtifactEntry>,
    /// Summary totals.
    #[serde(default)]
    pub totals: ManifestTotals,
}

// ============================================================================
// SECTION: Manifest Sum Type
// ============================================================================

/// Manifest parse failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestFormatError {
    /// Bytes are not a JSON object of the expected shape.
    #[error("malformed manifest: {0}")]
    Malformed(String),
    /// `manifest_version` is missing or not supported.
    #[error("unsupported manifest_version: {0}")]
    UnsupportedVersion(String),
}

/// Borrowed view of one declared artifact, uniform across generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactView<'a> {
    /// Declared relative path.
    pub path: &'a str,
    /// Declared size.
    pub size: u64,
    /// Declared digest.
    pub sha256: &'a str,
}

/// A manifest of either supported generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Manifest {
    /// Version 1.
    FileList(FileListManifest),
    /// Version 2.
    ArtifactList(ArtifactListManifest),
}

impl Manifest {
    /// Parses manifest bytes, dispatching on `manifest_version`.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestFormatError`] when the JSON is malformed or the
    /// version is not supported.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, ManifestFormatError> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|err| ManifestFormatError::Malformed(err.to_string()))?;
        if !value.is_object() {
            return Err(ManifestFormatError::Malformed("manifest must be a JSON object".to_string()));
        }
        match value.get("manifest_version") {
            Some(Value::Number(number)) if number.as_u64() == Some(FILE_LIST_MANIFEST_VERSION) => {
                serde_json::from_value(value)
                    .map(Self::FileList)
                    .map_err(|err| ManifestFormatError::Malformed(err.to_string()))
            }
            Some(Value::Number(number))
                if number.as_u64() == Some(ARTIFACT_LIST_MANIFEST_VERSION) =>
            {
                serde_json::from_value(value)
                    .map(Self::ArtifactList)
                    .map_err(|err| ManifestFormatError::Malformed(err.to_string()))
            }
            Some(other) => Err(ManifestFormatError::UnsupportedVersion(other.to_string())),
            None => Err(ManifestFormatError::UnsupportedVersion("missing".to_string())),
        }
    }

    /// Returns the generation tag.
    #[must_use]
    pub const fn version(&self) -> u64 {
        match self {
            Self::FileList(_) => FILE_LIST_MANIFEST_VERSION,
            Self::ArtifactList(_) => ARTIFACT_LIST_MANIFEST_VERSION,
        }
    }

    /// Returns the declared digest algorithm label.
    #[must_use]
    pub fn hash_alg(&self) -> &str {
        match self {
            Self::FileList(manifest) => &manifest.hash_alg,
            Self::ArtifactList(manifest) => &manifest.hash_alg,
        }
    }

    /// Returns the release identifier.
    #[must_use]
    pub const fn release_id(&self) -> &ReleaseId {
        match self {
            Self::FileList(manifest) => &manifest.release_id,
            Self::ArtifactList(manifest) => &manifest.release_id,
        }
    }

    /// Returns the creation time.
    #[must_use]
    pub const fn created_utc(&self) -> UtcTimestamp {
        match self {
            Self::FileList(manifest) => manifest.created_utc,
            Self::ArtifactList(manifest) => manifest.created_utc,
        }
    }

    /// Returns every declared artifact in manifest order.
    #[must_use]
    pub fn artifacts(&self) -> Vec<ArtifactView<'_>> {
        match self {
            Self::FileList(manifest) => manifest
                .shots
                .iter()
                .flat_map(|shot| shot.files.iter())
                .map(|file| ArtifactView {
                    path: &file.path,
                    size: file.bytes,
                    sha256: &file.sha256,
                })
                .collect(),
            Self::ArtifactList(manifest) => manifest
                .artifacts
                .iter()
                .map(|artifact| ArtifactView {
                    path: &artifact.path,
                    size: artifact.size,
                    sha256: &artifact.sha256,
                })
                .collect(),
        }
    }
}

/// Computes totals for a shot-grouped listing.
#[must_use]
pub fn file_list_totals(shots: &[ShotFiles]) -> ManifestTotals {
    let mut totals = ManifestTotals::default();
    for shot in shots {
        totals.total_shots += 1;
        for file in &shot.files {
            totals.total_files += 1;
            totals.total_bytes = totals.total_bytes.saturating_add(file.bytes);
        }
    }
    totals
}

// ============================================================================
// SECTION: Tests
// ============================================================================

// crates/reelgate-core/src/runtime/verifier.rs
// ============================================================================
// Module: Reelgate Manifest Verifier
// Description: Offline integrity verification of release and bundle manifests.
// Purpose: Recompute every declared artifact and report all discrepancies.
// Dependencies: crate::core, serde
// ============================================================================

//! ## Overview
//! Verification is a pure function of the manifest and the filesystem. The
//! verifier checks the generation and digest algorithm, then resolves every
//! declared artifact against its base directory and recomputes size and hash.
//! All problems are accumulated into one [`VerificationReport`]; success
//! requires zero issues and at least one checked artifact.
//!
//! File-list manifests resolve paths against the directory holding
//! `manifest.json`. Artifact-list manifests resolve against a caller-supplied
//! tree root.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::core::error::PipelineError;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::HashAlgorithm;
use crate::core::hashing::HashError;
use crate::core::hashing::digest_file;
use crate::core::hashing::digests_match;
use crate::core::hashing::hash_bytes;
use crate::core::manifest::Manifest;
use crate::core::manifest::ManifestFormatError;
use crate::core::paths::resolve_within;
use crate::runtime::files::MAX_MANIFEST_BYTES;
use crate::runtime::files::read_bytes_with_limit;

// ============================================================================
// SECTION: Verification Types
// ============================================================================

/// Verification status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// Verification succeeded.
    Pass,
    /// Verification failed.
    Fail,
}

/// Class of a verification problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// `manifest_version` is missing or not supported.
    UnsupportedVersion,
    /// `hash_alg` is not the supported digest.
    UnsupportedHashAlg,
    /// Declared path is absolute or escapes the base directory.
    UnsafePath,
    /// Declared file does not exist.
    Missing,
    /// Size differs from the declared value.
    SizeMismatch,
    /// Digest differs from the declared value.
    HashMismatch,
    /// Manifest declares no artifacts.
    Empty,
}

impl IssueKind {
    /// Returns the stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnsupportedVersion => "unsupported_version",
            Self::UnsupportedHashAlg => "unsupported_hash_alg",
            Self::UnsafePath => "unsafe_path",
            Self::Missing => "missing",
            Self::SizeMismatch => "size_mismatch",
            Self::HashMismatch => "hash_mismatch",
            Self::Empty => "empty",
        }
    }
}

/// One verification problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationIssue {
    /// Problem class.
    pub kind: IssueKind,
    /// Declared artifact path, when the issue concerns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Human-readable detail.
    pub detail: String,
}

impl VerificationIssue {
    /// Builds an issue.
    fn new(kind: IssueKind, path: Option<&str>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.map(str::to_string),
            detail: detail.into(),
        }
    }
}

/// Complete verification report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Verification status.
    pub status: VerificationStatus,
    /// Generation of the manifest when it could be determined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_version: Option<u64>,
    /// Count of artifacts that matched.
    pub checked_files: usize,
    /// Every problem found, in manifest order.
    pub issues: Vec<VerificationIssue>,
}

impl VerificationReport {
    /// Builds a report from accumulated issues.
    fn from_issues(
        manifest_version: Option<u64>,
        checked_files: usize,
        issues: Vec<VerificationIssue>,
    ) -> Self {
        let status = if issues.is_empty() && checked_files > 0 {
            VerificationStatus::Pass
        } else {
            VerificationStatus::Fail
        };
        Self {
            status,
            manifest_version,
            checked_files,
            issues,
        }
    }

    /// Returns true when verification passed.
    #[must_use]
    pub fn is_pass(&self) -> bool {
        self.status == VerificationStatus::Pass
    }

    /// Converts a failed report into the most specific [`PipelineError`].
    ///
    /// Format problems outrank unsafe paths, which outrank missing files,
    /// which outrank hash and size mismatches.
    ///
    /// # Errors
    ///
    /// Returns the mapped error when the report did not pass.
    pub fn into_result(self) -> Result<Self, PipelineError> {
        if self.is_pass() {
            return Ok(self);
        }
        let details: Vec<String> = self.issues.iter().map(describe_issue).collect();
        let has = |kinds: &[IssueKind]| self.issues.iter().any(|issue| kinds.contains(&issue.kind));
        let joined = details.join("; ");
        if has(&[IssueKind::UnsupportedVersion, IssueKind::UnsupportedHashAlg]) {
            return Err(PipelineError::UnsupportedFormat(joined));
        }
        if has(&[IssueKind::UnsafePath]) {
            return Err(PipelineError::UnsafePath(joined));
        }
        if has(&[IssueKind::Missing]) {
            return Err(PipelineError::NotFound(joined));
        }
        if has(&[IssueKind::SizeMismatch, IssueKind::HashMismatch]) {
            return Err(PipelineError::IntegrityMismatch {
                details,
            });
        }
        Err(PipelineError::Invalid(if joined.is_empty() {
            "manifest declares no artifacts".to_string()
        } else {
            joined
        }))
    }
}

/// Renders an issue as one line.
fn describe_issue(issue: &VerificationIssue) -> String {
    match &issue.path {
        Some(path) => format!("{path}: {}", issue.detail),
        None => issue.detail.clone(),
    }
}

/// A manifest that passed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedManifest {
    /// Parsed manifest.
    pub manifest: Manifest,
    /// Passing report.
    pub report: VerificationReport,
    /// SHA-256 of the manifest file bytes.
    pub manifest_sha256: String,
    /// Directory holding the manifest.
    pub manifest_dir: PathBuf,
}

// ============================================================================
// SECTION: Verifier
// ============================================================================

/// Manifest verifier for offline validation.
#[derive(Debug, Clone, Copy)]
pub struct ManifestVerifier {
    /// Hash algorithm trusted by the verifier.
    hash_algorithm: HashAlgorithm,
}

impl Default for ManifestVerifier {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_ALGORITHM)
    }
}

impl ManifestVerifier {
    /// Creates a new verifier.
    #[must_use]
    pub const fn new(hash_algorithm: HashAlgorithm) -> Self {
        Self {
            hash_algorithm,
        }
    }

    /// Verifies a parsed manifest against `base_dir`.
    #[must_use]
    pub fn verify_manifest(&self, manifest: &Manifest, base_dir: &Path) -> VerificationReport {
        let version = Some(manifest.version());
        if HashAlgorithm::parse(manifest.hash_alg()) != Some(self.hash_algorithm) {
            return VerificationReport::from_issues(
                version,
                0,
                vec![VerificationIssue::new(
                    IssueKind::UnsupportedHashAlg,
                    None,
                    format!(
                        "hash_alg '{}' is not supported; expected {}",
                        manifest.hash_alg(),
                        self.hash_algorithm.as_str()
                    ),
                )],
            );
        }
        let mut issues = Vec::new();
        let mut checked = 0_usize;
        let artifacts = manifest.artifacts();
        for artifact in &artifacts {
            let resolved = match resolve_within(base_dir, artifact.path) {
                Ok(resolved) => resolved,
                Err(err) => {
                    issues.push(VerificationIssue::new(
                        IssueKind::UnsafePath,
                        Some(artifact.path),
                        err.to_string(),
                    ));
                    continue;
                }
            };
            if !resolved.is_file() {
                issues.push(VerificationIssue::new(
                    IssueKind::Missing,
                    Some(artifact.path),
                    "missing artifact",
                ));
                continue;
            }
            let digest = match digest_file(&resolved) {
                Ok(digest) => digest,
                Err(HashError::NotFound(_)) => {
                    issues.push(VerificationIssue::new(
                        IssueKind::Missing,
                        Some(artifact.path),
                        "missing artifact",
                    ));
                    continue;
                }
                Err(err) => {
                    issues.push(VerificationIssue::new(
                        IssueKind::Missing,
                        Some(artifact.path),
                        format!("unreadable artifact: {err}"),
                    ));
                    continue;
                }
            };
            let mut matched = true;
            if digest.size != artifact.size {
                matched = false;
                issues.push(VerificationIssue::new(
                    IssueKind::SizeMismatch,
                    Some(artifact.path),
                    format!("size {} does not match declared {}", digest.size, artifact.size),
                ));
            }
            if !digests_match(artifact.sha256, &digest.sha256) {
                matched = false;
                issues.push(VerificationIssue::new(
                    IssueKind::HashMismatch,
                    Some(artifact.path),
                    format!("sha256 {} does not match declared {}", digest.sha256, artifact.sha256),
                ));
            }
            if matched {
                checked = checked.saturating_add(1);
            }
        }
        if artifacts.is_empty() {
            issues.push(VerificationIssue::new(
                IssueKind::Empty,
                None,
                "manifest declares no artifacts",
            ));
        }
        VerificationReport::from_issues(version, checked, issues)
    }

    /// Reads, parses, and verifies a manifest file, returning the report
    /// whether or not it passed.
    ///
    /// `tree_root` is the base directory for artifact-list manifests.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NotFound`] when the manifest is missing and
    /// [`PipelineError::Invalid`] when it is not valid JSON.
    pub fn inspect_file(
        &self,
        manifest_path: &Path,
        tree_root: &Path,
    ) -> Result<(Option<Manifest>, VerificationReport), PipelineError> {
        let bytes = read_bytes_with_limit(manifest_path, MAX_MANIFEST_BYTES)?;
        self.inspect_bytes(&bytes, manifest_path, tree_root)
    }

    /// Verifies a manifest file and fails on any issue.
    ///
    /// # Errors
    ///
    /// Returns the error mapped by [`VerificationReport::into_result`], or the
    /// errors of [`Self::inspect_file`].
    pub fn verify_file(
        &self,
        manifest_path: &Path,
        tree_root: &Path,
    ) -> Result<VerifiedManifest, PipelineError> {
        let bytes = read_bytes_with_limit(manifest_path, MAX_MANIFEST_BYTES)?;
        let (manifest, report) = self.inspect_bytes(&bytes, manifest_path, tree_root)?;
        let report = report.into_result()?;
        let Some(manifest) = manifest else {
            return Err(PipelineError::UnsupportedFormat(manifest_path.display().to_string()));
        };
        Ok(VerifiedManifest {
            manifest,
            report,
            manifest_sha256: hash_bytes(&bytes),
            manifest_dir: manifest_dir(manifest_path),
        })
    }

    /// Parses manifest bytes and verifies them against the right base directory.
    fn inspect_bytes(
        &self,
        bytes: &[u8],
        manifest_path: &Path,
        tree_root: &Path,
    ) -> Result<(Option<Manifest>, VerificationReport), PipelineError> {
        let manifest = match Manifest::from_json_bytes(bytes) {
            Ok(manifest) => manifest,
            Err(ManifestFormatError::UnsupportedVersion(version)) => {
                let report = VerificationReport::from_issues(
                    None,
                    0,
                    vec![VerificationIssue::new(
                        IssueKind::UnsupportedVersion,
                        None,
                        format!("manifest_version {version} is not supported"),
                    )],
                );
                return Ok((None, report));
            }
            Err(err @ ManifestFormatError::Malformed(_)) => {
                return Err(PipelineError::Invalid(format!(
                    "{}: {err}",
                    manifest_path.display()
                )));
            }
        };
        let base_dir = match &manifest {
            Manifest::FileList(_) => manifest_dir(manifest_path),
            Manifest::ArtifactList(_) => tree_root.to_path_buf(),
        };
        let report = self.verify_manifest(&manifest, &base_dir);
        Ok((Some(manifest), report))
    }
}

/// Returns the directory holding a manifest.
fn manifest_dir(manifest_path: &Path) -> PathBuf {
    match manifest_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

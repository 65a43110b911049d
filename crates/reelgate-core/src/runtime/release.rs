// crates/reelgate-core/src/runtime/release.rs
// ============================================================================
// Module: Reelgate Release Builder
// Description: Release directory assembly and manifest generation.
// Purpose: Snapshot DONE shots into write-once, content-addressed releases.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! A release copies every output of every DONE shot into
//! `<releases>/<release_id>/<shot_id>/<key>`, re-hashes each copy at its
//! destination, and writes a file-list manifest beside them. Every source is
//! validated before the release directory is created; a failure during the
//! copy removes the partial directory. An existing release directory is never
//! reused.
//!
//! The artifact-list manifest records `preview.mp4` and `qc.json` of each
//! DONE shot in place, relative to the state document directory, without
//! copying.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use crate::core::audit::AuditEvent;
use crate::core::error::PipelineError;
use crate::core::hashing::HashAlgorithm;
use crate::core::hashing::canonical_json_bytes;
use crate::core::hashing::digest_file;
use crate::core::identifiers::ProjectId;
use crate::core::identifiers::ReleaseId;
use crate::core::identifiers::ShotId;
use crate::core::manifest::ARTIFACT_LIST_MANIFEST_VERSION;
use crate::core::manifest::ArtifactEntry;
use crate::core::manifest::ArtifactListManifest;
use crate::core::manifest::FILE_LIST_MANIFEST_VERSION;
use crate::core::manifest::FileListManifest;
use crate::core::manifest::MANIFEST_FILE_NAME;
use crate::core::manifest::ManifestKind;
use crate::core::manifest::ManifestTotals;
use crate::core::manifest::ShotFileEntry;
use crate::core::manifest::ShotFiles;
use crate::core::manifest::file_list_totals;
use crate::core::paths::ensure_single_segment;
use crate::core::paths::resolve_within;
use crate::core::shot::REQUIRED_RELEASE_OUTPUTS;
use crate::core::shot::Shot;
use crate::core::shot::ShotStatus;
use crate::core::shot::StateDocument;
use crate::core::time::UtcTimestamp;
use crate::interfaces::AuditSink;
use crate::runtime::files::ExistingTarget;
use crate::runtime::files::copy_file_verified;
use crate::runtime::files::discard_partial_dir;
use crate::runtime::files::io_failure;
use crate::runtime::files::write_new_atomic;

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Release or artifact manifest build request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRequest {
    /// Release identifier; becomes a directory name.
    pub release_id: ReleaseId,
    /// Project recorded in the manifest.
    pub project_id: Option<ProjectId>,
    /// Directory holding all releases.
    pub releases_root: PathBuf,
    /// Creation time recorded in the manifest.
    pub created_utc: UtcTimestamp,
}

/// Written release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltRelease<M> {
    /// Release directory.
    pub release_dir: PathBuf,
    /// Manifest path.
    pub manifest_path: PathBuf,
    /// Manifest contents.
    pub manifest: M,
}

/// One output scheduled for copying.
struct PlannedFile {
    /// Output key.
    key: String,
    /// Recorded relative path.
    source: String,
    /// Resolved source path.
    source_path: PathBuf,
}

/// One DONE shot scheduled for release.
struct PlannedShot {
    /// Shot identifier.
    shot_id: ShotId,
    /// Shot phase.
    phase: String,
    /// Outputs in key order.
    files: Vec<PlannedFile>,
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builds releases from a state document.
pub struct ReleaseBuilder<A> {
    /// Audit sink.
    audit: A,
    /// Digest algorithm recorded in manifests.
    hash_algorithm: HashAlgorithm,
}

impl<A: AuditSink> ReleaseBuilder<A> {
    /// Creates a builder.
    #[must_use]
    pub const fn new(audit: A, hash_algorithm: HashAlgorithm) -> Self {
        Self {
            audit,
            hash_algorithm,
        }
    }

    /// Copies DONE shots into a new release directory and writes its
    /// file-list manifest.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::AlreadyExists`] when the release directory
    /// exists, [`PipelineError::Invalid`] when no shot is DONE or a DONE shot
    /// lacks required outputs, and [`PipelineError::NotFound`] or
    /// [`PipelineError::UnsafePath`] for bad output paths. The filesystem is
    /// left untouched on any of these.
    pub fn build_release(
        &self,
        document: &StateDocument,
        base_dir: &Path,
        request: &ReleaseRequest,
    ) -> Result<BuiltRelease<FileListManifest>, PipelineError> {
        ensure_single_segment(request.release_id.as_str())?;
        let release_dir = request.releases_root.join(request.release_id.as_str());
        if release_dir.exists() {
            return Err(PipelineError::AlreadyExists(release_dir.display().to_string()));
        }
        let planned = plan_release(document, base_dir)?;

        fs::create_dir_all(&request.releases_root)
            .map_err(|err| io_failure(&request.releases_root, &err))?;
        fs::create_dir(&release_dir).map_err(|err| io_failure(&release_dir, &err))?;
        match self.write_release(&release_dir, planned, request) {
            Ok(built) => {
                self.audit.record(&AuditEvent::ReleaseBuilt {
                    at: request.created_utc,
                    release_id: request.release_id.clone(),
                    totals: built.manifest.totals,
                });
                Ok(built)
            }
            Err(err) => Err(discard_partial_dir(&release_dir, err)),
        }
    }

    /// Writes a flat artifact-list manifest over DONE shots' preview and QC
    /// outputs without copying them.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::AlreadyExists`] when the manifest exists and
    /// the same validation errors as [`Self::build_release`].
    pub fn build_artifact_manifest(
        &self,
        document: &StateDocument,
        base_dir: &Path,
        request: &ReleaseRequest,
    ) -> Result<BuiltRelease<ArtifactListManifest>, PipelineError> {
        ensure_single_segment(request.release_id.as_str())?;
        let release_dir = request.releases_root.join(request.release_id.as_str());
        let manifest_path = release_dir.join(MANIFEST_FILE_NAME);
        if manifest_path.exists() {
            return Err(PipelineError::AlreadyExists(manifest_path.display().to_string()));
        }
        let planned = plan_release(document, base_dir)?;
        let mut seen = BTreeSet::new();
        let mut artifacts = Vec::new();
        let mut totals = ManifestTotals::default();
        for shot in &planned {
            totals.total_shots += 1;
            for file in shot.files.iter().filter(|file| is_required_output(&file.key)) {
                if !seen.insert(file.source.clone()) {
                    continue;
                }
                let digest = digest_file(&file.source_path)?;
                totals.total_files += 1;
                totals.total_bytes = totals.total_bytes.saturating_add(digest.size);
                artifacts.push(ArtifactEntry {
                    path: file.source.clone(),
                    size: digest.size,
                    sha256: digest.sha256,
                });
            }
        }
        artifacts.sort_by(|left, right| left.path.cmp(&right.path));
        let manifest = ArtifactListManifest {
            manifest_version: ARTIFACT_LIST_MANIFEST_VERSION,
            kind: ManifestKind::Release,
            hash_alg: self.hash_algorithm.as_str().to_string(),
            release_id: request.release_id.clone(),
            project_id: request.project_id.clone(),
            created_utc: request.created_utc,
            artifacts,
            totals,
        };
        write_new_atomic(&manifest_path, &canonical_json_bytes(&manifest)?)?;
        self.audit.record(&AuditEvent::ManifestBuilt {
            at: request.created_utc,
            release_id: request.release_id.clone(),
            totals,
        });
        Ok(BuiltRelease {
            release_dir,
            manifest_path,
            manifest,
        })
    }

    /// Copies planned shots and writes the manifest into `release_dir`.
    fn write_release(
        &self,
        release_dir: &Path,
        planned: Vec<PlannedShot>,
        request: &ReleaseRequest,
    ) -> Result<BuiltRelease<FileListManifest>, PipelineError> {
        let mut shots = Vec::with_capacity(planned.len());
        for shot in planned {
            let mut files = Vec::with_capacity(shot.files.len());
            for file in shot.files {
                let dest = format!("{}/{}", shot.shot_id, release_file_name(&file));
                let outcome = copy_file_verified(
                    &file.source_path,
                    &release_dir.join(&dest),
                    ExistingTarget::Reject,
                )?;
                files.push(ShotFileEntry {
                    key: file.key,
                    source: file.source,
                    path: dest.clone(),
                    dest,
                    bytes: outcome.digest.size,
                    sha256: outcome.digest.sha256,
                });
            }
            shots.push(ShotFiles {
                shot_id: shot.shot_id,
                phase: Some(shot.phase),
                files,
            });
        }
        let totals = file_list_totals(&shots);
        let manifest = FileListManifest {
            manifest_version: FILE_LIST_MANIFEST_VERSION,
            kind: ManifestKind::Release,
            hash_alg: self.hash_algorithm.as_str().to_string(),
            release_id: request.release_id.clone(),
            project_id: request.project_id.clone(),
            created_utc: request.created_utc,
            shots,
            sources: Vec::new(),
            totals,
        };
        let manifest_path = release_dir.join(MANIFEST_FILE_NAME);
        write_new_atomic(&manifest_path, &canonical_json_bytes(&manifest)?)?;
        Ok(BuiltRelease {
            release_dir: release_dir.to_path_buf(),
            manifest_path,
            manifest,
        })
    }
}

// ============================================================================
// SECTION: Planning
// ============================================================================

/// Validates every DONE shot and resolves its outputs.
fn plan_release(
    document: &StateDocument,
    base_dir: &Path,
) -> Result<Vec<PlannedShot>, PipelineError> {
    let done: Vec<&Shot> = document.shots_with_status(ShotStatus::Done).collect();
    if done.is_empty() {
        return Err(PipelineError::Invalid("no DONE shots found; nothing to release".to_string()));
    }
    let mut planned = Vec::with_capacity(done.len());
    for shot in done {
        ensure_single_segment(shot.id.as_str())?;
        for key in REQUIRED_RELEASE_OUTPUTS {
            if shot.output(key).is_none() {
                return Err(PipelineError::Invalid(format!(
                    "shot {} is DONE but lacks outputs['{key}']",
                    shot.id
                )));
            }
        }
        let mut files = Vec::new();
        for (key, relative) in &shot.outputs {
            if relative.trim().is_empty() {
                continue;
            }
            ensure_single_segment(key)?;
            let source_path = resolve_within(base_dir, relative)?;
            if !source_path.is_file() {
                return Err(PipelineError::NotFound(format!(
                    "shot {} outputs['{key}'] file missing on disk: {relative}",
                    shot.id
                )));
            }
            files.push(PlannedFile {
                key: key.clone(),
                source: relative.trim().to_string(),
                source_path,
            });
        }
        let mut names = BTreeSet::new();
        for file in &files {
            let name = release_file_name(file);
            if !names.insert(name.clone()) {
                return Err(PipelineError::Invalid(format!(
                    "shot {} has two outputs released as {name}",
                    shot.id
                )));
            }
        }
        planned.push(PlannedShot {
            shot_id: shot.id.clone(),
            phase: shot.phase.clone(),
            files,
        });
    }
    Ok(planned)
}

/// Returns true for outputs every released shot must carry.
fn is_required_output(key: &str) -> bool {
    REQUIRED_RELEASE_OUTPUTS.contains(&key)
}

/// Names the released copy after its key, borrowing the source extension
/// when the key has none.
fn release_file_name(file: &PlannedFile) -> String {
    if file.key.contains('.') {
        return file.key.clone();
    }
    match file.source_path.extension() {
        Some(extension) => format!("{}.{}", file.key, extension.to_string_lossy()),
        None => file.key.clone(),
    }
}

// crates/reelgate-core/src/runtime/bundle.rs
// ============================================================================
// Module: Reelgate Bundle Merger
// Description: Merge several verified releases into one bundle release.
// Purpose: Resolve shot collisions deterministically and copy with re-hashing.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Each source release is re-verified before anything else happens. Shots are
//! then claimed source by source; a shot claimed twice is either a hard
//! [`PipelineError::Conflict`] (`fail`) or goes to the source with the later
//! `created_utc` (`latest`, ties keep the earlier source). Every surviving
//! file is checked on disk before the bundle directory is created, so a
//! rejected bundle leaves no trace. Copies are re-hashed at their destination.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use crate::core::audit::AuditEvent;
use crate::core::error::PipelineError;
use crate::core::hashing::HashAlgorithm;
use crate::core::hashing::canonical_json_bytes;
use crate::core::hashing::hash_bytes;
use crate::core::identifiers::ProjectId;
use crate::core::identifiers::ReleaseId;
use crate::core::identifiers::ShotId;
use crate::core::manifest::ConflictPolicy;
use crate::core::manifest::FILE_LIST_MANIFEST_VERSION;
use crate::core::manifest::FileListManifest;
use crate::core::manifest::MANIFEST_FILE_NAME;
use crate::core::manifest::Manifest;
use crate::core::manifest::ManifestFormatError;
use crate::core::manifest::ManifestKind;
use crate::core::manifest::ShotFileEntry;
use crate::core::manifest::ShotFiles;
use crate::core::manifest::SourceRecord;
use crate::core::manifest::file_list_totals;
use crate::core::paths::ensure_single_segment;
use crate::core::paths::resolve_within;
use crate::core::time::UtcTimestamp;
use crate::interfaces::AuditSink;
use crate::runtime::files::ExistingTarget;
use crate::runtime::files::MAX_MANIFEST_BYTES;
use crate::runtime::files::copy_file_verified;
use crate::runtime::files::discard_partial_dir;
use crate::runtime::files::io_failure;
use crate::runtime::files::read_bytes_with_limit;
use crate::runtime::files::write_new_atomic;
use crate::runtime::release::BuiltRelease;
use crate::runtime::verifier::ManifestVerifier;

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Bundle build request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleRequest {
    /// Source release directories, each holding a `manifest.json`.
    pub sources: Vec<PathBuf>,
    /// Bundle identifier; becomes a directory name.
    pub bundle_id: ReleaseId,
    /// Optional allow-list of shot ids.
    pub shot_filter: Option<BTreeSet<ShotId>>,
    /// Collision handling.
    pub conflict_policy: ConflictPolicy,
    /// Directory the bundle directory is created in.
    pub output_root: PathBuf,
    /// Creation time recorded in the manifest.
    pub created_utc: UtcTimestamp,
    /// Project recorded in the manifest.
    pub project_id: Option<ProjectId>,
}

/// A verified source release.
struct LoadedSource {
    /// Directory holding the source manifest.
    dir: PathBuf,
    /// Parsed file-list manifest.
    manifest: FileListManifest,
}

/// A file scheduled for copying into the bundle.
struct PlannedCopy {
    /// Output key.
    key: String,
    /// Provenance string `<release>:<path>`.
    source: String,
    /// Resolved source file.
    source_path: PathBuf,
    /// Destination relative to the bundle directory.
    dest: String,
}

// ============================================================================
// SECTION: Merger
// ============================================================================

/// Merges verified releases into a bundle.
pub struct BundleMerger<A> {
    /// Audit sink.
    audit: A,
    /// Digest algorithm recorded in the bundle manifest.
    hash_algorithm: HashAlgorithm,
    /// Source verifier.
    verifier: ManifestVerifier,
}

impl<A: AuditSink> BundleMerger<A> {
    /// Creates a merger.
    #[must_use]
    pub const fn new(audit: A, hash_algorithm: HashAlgorithm) -> Self {
        Self {
            audit,
            hash_algorithm,
            verifier: ManifestVerifier::new(hash_algorithm),
        }
    }

    /// Builds the bundle described by `request`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::AlreadyExists`] when the bundle directory
    /// exists, the verifier's error for a failing source,
    /// [`PipelineError::UnsupportedFormat`] for a non file-list source,
    /// [`PipelineError::Conflict`] for a collision under `fail`,
    /// [`PipelineError::NotFound`] for unknown filtered shots or missing
    /// files, and [`PipelineError::Invalid`] when nothing would be bundled.
    /// None of these create the bundle directory.
    pub fn build_bundle(
        &self,
        request: &BundleRequest,
    ) -> Result<BuiltRelease<FileListManifest>, PipelineError> {
        ensure_single_segment(request.bundle_id.as_str())?;
        let bundle_dir = request.output_root.join(request.bundle_id.as_str());
        if bundle_dir.exists() {
            return Err(PipelineError::AlreadyExists(bundle_dir.display().to_string()));
        }
        if request.sources.is_empty() {
            return Err(PipelineError::Invalid("bundle requires at least one source".to_string()));
        }

        let mut loaded = Vec::with_capacity(request.sources.len());
        let mut records = Vec::with_capacity(request.sources.len());
        for source_dir in &request.sources {
            let (source, record) = self.load_source(source_dir)?;
            loaded.push(source);
            records.push(record);
        }

        let owners = self.claim_shots(&loaded, request)?;
        if owners.is_empty() {
            return Err(PipelineError::Invalid("no shots selected for bundle".to_string()));
        }
        let planned = plan_copies(&loaded, &owners)?;

        fs::create_dir_all(&request.output_root)
            .map_err(|err| io_failure(&request.output_root, &err))?;
        fs::create_dir(&bundle_dir).map_err(|err| io_failure(&bundle_dir, &err))?;
        match self.write_bundle(&bundle_dir, planned, records, request) {
            Ok(built) => {
                self.audit.record(&AuditEvent::BundleBuilt {
                    at: request.created_utc,
                    bundle_id: request.bundle_id.clone(),
                    sources: u64::try_from(request.sources.len()).unwrap_or(u64::MAX),
                    totals: built.manifest.totals,
                });
                Ok(built)
            }
            Err(err) => Err(discard_partial_dir(&bundle_dir, err)),
        }
    }

    /// Verifies one source release and records its provenance.
    ///
    /// The generation is checked before any artifact is hashed so a flat
    /// manifest is reported as unsupported rather than as missing files.
    fn load_source(&self, source_dir: &Path) -> Result<(LoadedSource, SourceRecord), PipelineError> {
        let manifest_path = source_dir.join(MANIFEST_FILE_NAME);
        if !manifest_path.is_file() {
            return Err(PipelineError::NotFound(format!(
                "source manifest {}",
                manifest_path.display()
            )));
        }
        let bytes = read_bytes_with_limit(&manifest_path, MAX_MANIFEST_BYTES)?;
        let manifest = match Manifest::from_json_bytes(&bytes) {
            Ok(Manifest::FileList(manifest)) => manifest,
            Ok(other) => {
                return Err(PipelineError::UnsupportedFormat(format!(
                    "{}: bundles accept manifest_version {FILE_LIST_MANIFEST_VERSION} sources only, found {}",
                    manifest_path.display(),
                    other.version()
                )));
            }
            Err(ManifestFormatError::UnsupportedVersion(version)) => {
                return Err(PipelineError::UnsupportedFormat(format!(
                    "{}: manifest_version {version} is not supported",
                    manifest_path.display()
                )));
            }
            Err(err @ ManifestFormatError::Malformed(_)) => {
                return Err(PipelineError::Invalid(format!("{}: {err}", manifest_path.display())));
            }
        };
        self.verifier
            .verify_manifest(&Manifest::FileList(manifest.clone()), source_dir)
            .into_result()?;
        let record = SourceRecord {
            source_release_id: manifest.release_id.clone(),
            source_manifest_hash: hash_bytes(&bytes),
            source_path: manifest_path.display().to_string(),
            created_utc: manifest.created_utc,
        };
        Ok((
            LoadedSource {
                dir: source_dir.to_path_buf(),
                manifest,
            },
            record,
        ))
    }

    /// Assigns each selected shot to exactly one source index.
    fn claim_shots(
        &self,
        sources: &[LoadedSource],
        request: &BundleRequest,
    ) -> Result<BTreeMap<ShotId, usize>, PipelineError> {
        let mut owners: BTreeMap<ShotId, usize> = BTreeMap::new();
        for (index, source) in sources.iter().enumerate() {
            for shot in &source.manifest.shots {
                if let Some(filter) = &request.shot_filter
                    && !filter.contains(&shot.shot_id)
                {
                    continue;
                }
                let Some(&owner) = owners.get(&shot.shot_id) else {
                    owners.insert(shot.shot_id.clone(), index);
                    continue;
                };
                let (kept, dropped) = match request.conflict_policy {
                    ConflictPolicy::Fail => {
                        return Err(PipelineError::Conflict {
                            shot: shot.shot_id.clone(),
                            first: sources[owner].manifest.release_id.to_string(),
                            second: source.manifest.release_id.to_string(),
                        });
                    }
                    ConflictPolicy::Latest => {
                        if source.manifest.created_utc > sources[owner].manifest.created_utc {
                            owners.insert(shot.shot_id.clone(), index);
                            (index, owner)
                        } else {
                            (owner, index)
                        }
                    }
                };
                self.audit.record(&AuditEvent::BundleConflictResolved {
                    at: request.created_utc,
                    shot_id: shot.shot_id.clone(),
                    kept: sources[kept].manifest.release_id.clone(),
                    dropped: sources[dropped].manifest.release_id.clone(),
                    policy: request.conflict_policy,
                });
            }
        }
        if let Some(filter) = &request.shot_filter {
            let unknown: Vec<&str> = filter
                .iter()
                .filter(|id| !owners.contains_key(*id))
                .map(ShotId::as_str)
                .collect();
            if !unknown.is_empty() {
                return Err(PipelineError::NotFound(format!(
                    "shots not present in any source: {}",
                    unknown.join(", ")
                )));
            }
        }
        Ok(owners)
    }

    /// Copies planned files and writes the bundle manifest.
    fn write_bundle(
        &self,
        bundle_dir: &Path,
        planned: Vec<(ShotFiles, Vec<PlannedCopy>)>,
        sources: Vec<SourceRecord>,
        request: &BundleRequest,
    ) -> Result<BuiltRelease<FileListManifest>, PipelineError> {
        let mut shots = Vec::with_capacity(planned.len());
        for (mut shot, copies) in planned {
            for copy in copies {
                let outcome = copy_file_verified(
                    &copy.source_path,
                    &bundle_dir.join(&copy.dest),
                    ExistingTarget::Reject,
                )?;
                shot.files.push(ShotFileEntry {
                    key: copy.key,
                    source: copy.source,
                    path: copy.dest.clone(),
                    dest: copy.dest,
                    bytes: outcome.digest.size,
                    sha256: outcome.digest.sha256,
                });
            }
            shots.push(shot);
        }
        let totals = file_list_totals(&shots);
        let manifest = FileListManifest {
            manifest_version: FILE_LIST_MANIFEST_VERSION,
            kind: ManifestKind::Bundle,
            hash_alg: self.hash_algorithm.as_str().to_string(),
            release_id: request.bundle_id.clone(),
            project_id: request.project_id.clone(),
            created_utc: request.created_utc,
            shots,
            sources,
            totals,
        };
        let manifest_path = bundle_dir.join(MANIFEST_FILE_NAME);
        write_new_atomic(&manifest_path, &canonical_json_bytes(&manifest)?)?;
        Ok(BuiltRelease {
            release_dir: bundle_dir.to_path_buf(),
            manifest_path,
            manifest,
        })
    }
}

// ============================================================================
// SECTION: Planning
// ============================================================================

/// Resolves every file of every owned shot, in shot id order.
fn plan_copies(
    sources: &[LoadedSource],
    owners: &BTreeMap<ShotId, usize>,
) -> Result<Vec<(ShotFiles, Vec<PlannedCopy>)>, PipelineError> {
    let mut planned = Vec::with_capacity(owners.len());
    for (shot_id, &index) in owners {
        let source = &sources[index];
        let Some(shot) = source.manifest.shots.iter().find(|shot| &shot.shot_id == shot_id) else {
            return Err(PipelineError::NotFound(format!("shot {shot_id}")));
        };
        ensure_single_segment(shot_id.as_str())?;
        let mut seen = BTreeSet::new();
        let mut copies = Vec::with_capacity(shot.files.len());
        for entry in &shot.files {
            let source_path = resolve_within(&source.dir, &entry.path)?;
            if !source_path.is_file() {
                return Err(PipelineError::NotFound(format!(
                    "{}:{} file missing on disk",
                    source.manifest.release_id, entry.path
                )));
            }
            let file_name = base_name(&entry.path);
            if !seen.insert(file_name.to_string()) {
                return Err(PipelineError::Invalid(format!(
                    "shot {shot_id} has two files named {file_name}"
                )));
            }
            copies.push(PlannedCopy {
                key: entry.key.clone(),
                source: format!("{}:{}", source.manifest.release_id, entry.path),
                source_path,
                dest: format!("{shot_id}/{file_name}"),
            });
        }
        planned.push((
            ShotFiles {
                shot_id: shot_id.clone(),
                phase: shot.phase.clone(),
                files: Vec::with_capacity(copies.len()),
            },
            copies,
        ));
    }
    Ok(planned)
}

/// Returns the last segment of a manifest path.
fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

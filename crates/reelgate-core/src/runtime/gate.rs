// crates/reelgate-core/src/runtime/gate.rs
// ============================================================================
// Module: Reelgate Release Gate
// Description: Policy and integrity gate evaluated before shots are released.
// Purpose: Refuse any release whose policy, manifest, or QC evidence is doubtful.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The gate loads `project.json` and the release's `manifest.json` (by
//! default `projects/<project>/project.json` and
//! `releases/<release>/manifest.json` under the repository root), requires
//! every policy field to hold its mandated value, and requires the manifest
//! to verify. For file-list manifests it then re-checks the released copy of
//! `qc.json` for every shot in a passive-check phase. There is no partial
//! pass: the first failure is returned.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use crate::core::audit::AuditEvent;
use crate::core::error::PipelineError;
use crate::core::identifiers::ProjectId;
use crate::core::identifiers::ReleaseId;
use crate::core::manifest::FileListManifest;
use crate::core::manifest::MANIFEST_FILE_NAME;
use crate::core::manifest::Manifest;
use crate::core::paths::ensure_safe_relative;
use crate::core::paths::ensure_single_segment;
use crate::core::paths::resolve_within;
use crate::core::policy::PROJECT_FILE_NAME;
use crate::core::policy::ProjectFile;
use crate::core::policy::QcPolicy;
use crate::core::shot::QC_OUTPUT_KEY;
use crate::core::time::UtcTimestamp;
use crate::interfaces::AuditSink;
use crate::interfaces::QcReportValidator;
use crate::interfaces::ReleaseGate;
use crate::runtime::evidence::check_qc_report_file;
use crate::runtime::files::MAX_PROJECT_FILE_BYTES;
use crate::runtime::files::read_bytes_with_limit;
use crate::runtime::verifier::ManifestVerifier;
use crate::runtime::verifier::VerificationReport;

// ============================================================================
// SECTION: Layout
// ============================================================================

/// Default directory holding per-project policy files.
pub const DEFAULT_PROJECTS_DIR: &str = "projects";
/// Default directory holding releases.
pub const DEFAULT_RELEASES_DIR: &str = "releases";

/// Where the gate finds project and release files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateLayout {
    /// Repository root every gate path is relative to.
    pub repo_root: PathBuf,
    /// Projects directory relative to the root.
    pub projects_dir: String,
    /// Releases directory relative to the root.
    pub releases_dir: String,
}

impl GateLayout {
    /// Creates a layout with the default directory names.
    #[must_use]
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            projects_dir: DEFAULT_PROJECTS_DIR.to_string(),
            releases_dir: DEFAULT_RELEASES_DIR.to_string(),
        }
    }

    /// Default project file path relative to the root.
    #[must_use]
    pub fn project_file(&self, project_id: &ProjectId) -> String {
        format!("{}/{project_id}/{PROJECT_FILE_NAME}", self.projects_dir.trim_end_matches('/'))
    }

    /// Default manifest path relative to the root.
    #[must_use]
    pub fn manifest_file(&self, release_id: &ReleaseId) -> String {
        format!("{}/{release_id}/{MANIFEST_FILE_NAME}", self.releases_dir.trim_end_matches('/'))
    }
}

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Gate evaluation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateRequest {
    /// Project identifier.
    pub project_id: ProjectId,
    /// Release identifier.
    pub release_id: ReleaseId,
    /// Project file override relative to the root.
    pub project_file: Option<String>,
    /// Manifest override relative to the root.
    pub manifest: Option<String>,
    /// Evaluation time.
    pub at: UtcTimestamp,
}

/// Passing gate result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateReport {
    /// Project file that was enforced.
    pub project_file: PathBuf,
    /// Manifest that was verified.
    pub manifest_path: PathBuf,
    /// Manifest verification report.
    pub verification: VerificationReport,
    /// Number of released QC reports re-checked.
    pub qc_rechecked: usize,
}

// ============================================================================
// SECTION: Gate
// ============================================================================

/// Release gate over project policy and manifest integrity.
pub struct PolicyGate<V, A> {
    /// File layout.
    layout: GateLayout,
    /// QC report schema validator.
    validator: V,
    /// Audit sink.
    audit: A,
    /// Manifest verifier.
    verifier: ManifestVerifier,
}

impl<V, A> PolicyGate<V, A>
where
    V: QcReportValidator,
    A: AuditSink,
{
    /// Creates a gate.
    #[must_use]
    pub fn new(layout: GateLayout, validator: V, audit: A) -> Self {
        Self {
            layout,
            validator,
            audit,
            verifier: ManifestVerifier::default(),
        }
    }

    /// Evaluates the gate and records the decision.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] describing the first blocking failure:
    /// `NotFound` for missing files, `UnsafePath` for bad paths,
    /// `PolicyViolation` for policy or QC failures, and the verifier's mapped
    /// error for manifest problems.
    pub fn evaluate(&self, request: &GateRequest) -> Result<GateReport, PipelineError> {
        let result = self.evaluate_inner(request);
        self.audit.record(&AuditEvent::GateEvaluated {
            at: request.at,
            project_id: request.project_id.clone(),
            release_id: request.release_id.clone(),
            passed: result.is_ok(),
            reason: result.as_ref().err().map(ToString::to_string),
        });
        result
    }

    /// Evaluates the gate without auditing.
    fn evaluate_inner(&self, request: &GateRequest) -> Result<GateReport, PipelineError> {
        ensure_single_segment(request.project_id.as_str())?;
        ensure_single_segment(request.release_id.as_str())?;
        let project_rel = request
            .project_file
            .clone()
            .unwrap_or_else(|| self.layout.project_file(&request.project_id));
        let manifest_rel = request
            .manifest
            .clone()
            .unwrap_or_else(|| self.layout.manifest_file(&request.release_id));
        ensure_safe_relative(&project_rel)?;
        ensure_safe_relative(&manifest_rel)?;
        let project_file = resolve_within(&self.layout.repo_root, &project_rel)?;
        let manifest_path = resolve_within(&self.layout.repo_root, &manifest_rel)?;
        if !project_file.is_file() {
            return Err(PipelineError::NotFound(format!("project file {project_rel}")));
        }
        if !manifest_path.is_file() {
            return Err(PipelineError::NotFound(format!("release manifest {manifest_rel}")));
        }

        let project = ProjectFile::from_json_bytes(&read_bytes_with_limit(
            &project_file,
            MAX_PROJECT_FILE_BYTES,
        )?)?;
        project.policy.enforce()?;

        let verified = self.verifier.verify_file(&manifest_path, &self.layout.repo_root)?;
        if verified.manifest.release_id() != &request.release_id {
            return Err(PipelineError::PolicyViolation(format!(
                "manifest release_id {} does not match requested release {}",
                verified.manifest.release_id(),
                request.release_id
            )));
        }
        let qc_rechecked = match &verified.manifest {
            Manifest::FileList(manifest) => self.recheck_released_qc(
                manifest,
                &verified.manifest_dir,
                &project.qc_policy(),
            )?,
            Manifest::ArtifactList(_) => 0,
        };
        Ok(GateReport {
            project_file,
            manifest_path,
            verification: verified.report,
            qc_rechecked,
        })
    }

    /// Re-checks the released `qc.json` of every passive-check shot.
    fn recheck_released_qc(
        &self,
        manifest: &FileListManifest,
        manifest_dir: &Path,
        policy: &QcPolicy,
    ) -> Result<usize, PipelineError> {
        let mut rechecked = 0_usize;
        for shot in &manifest.shots {
            let Some(phase) = shot.phase.as_deref() else {
                continue;
            };
            if !policy.requires_passive_check(phase) {
                continue;
            }
            let Some(entry) = shot.files.iter().find(|file| file.key == QC_OUTPUT_KEY) else {
                return Err(PipelineError::PolicyViolation(format!(
                    "shot {} in phase {phase} has no released qc.json",
                    shot.shot_id
                )));
            };
            let path = resolve_within(manifest_dir, &entry.path)?;
            check_qc_report_file(&path, phase, policy, &self.validator).map_err(|reason| {
                PipelineError::PolicyViolation(format!(
                    "shot {} released qc.json: {reason}",
                    shot.shot_id
                ))
            })?;
            rechecked = rechecked.saturating_add(1);
        }
        Ok(rechecked)
    }
}

impl<V, A> ReleaseGate for PolicyGate<V, A>
where
    V: QcReportValidator,
    A: AuditSink,
{
    fn check(
        &self,
        project_id: &ProjectId,
        release_id: &ReleaseId,
        at: UtcTimestamp,
    ) -> Result<(), PipelineError> {
        self.evaluate(&GateRequest {
            project_id: project_id.clone(),
            release_id: release_id.clone(),
            project_file: None,
            manifest: None,
            at,
        })
        .map(|_| ())
    }
}

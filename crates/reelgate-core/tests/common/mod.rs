// crates/reelgate-core/tests/common/mod.rs
// ============================================================================
// Module: Core Test Fixtures
// Description: Shared trees, documents, and gates for pipeline tests.
// Purpose: Build realistic project trees on disk with minimal boilerplate.
// Dependencies: reelgate-core, serde_json, tempfile
// ============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::fs;
use std::path::Path;

use reelgate_core::PipelineError;
use reelgate_core::ProjectId;
use reelgate_core::ReleaseGate;
use reelgate_core::ReleaseId;
use reelgate_core::Shot;
use reelgate_core::ShotId;
use reelgate_core::ShotStatus;
use reelgate_core::StateDocument;
use reelgate_core::UtcTimestamp;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Time
// ============================================================================

/// Parses a fixed timestamp.
#[must_use]
pub fn at(value: &str) -> UtcTimestamp {
    UtcTimestamp::parse(value).unwrap()
}

/// Fixed base timestamp.
#[must_use]
pub fn t0() -> UtcTimestamp {
    at("2026-03-01T09:00:00Z")
}

// ============================================================================
// SECTION: Files
// ============================================================================

/// Writes `bytes` under `root`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, bytes: &[u8]) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, bytes).unwrap();
}

/// Writes a JSON value under `root`.
pub fn write_json(root: &Path, relative: &str, value: &Value) {
    write_file(root, relative, serde_json::to_vec_pretty(value).unwrap().as_slice());
}

/// Writes a passing QC report and a preview for `shot` under `renders/<shot>/`.
pub fn write_passing_outputs(root: &Path, shot: &str) {
    write_json(root, &format!("renders/{shot}/qc.json"), &json!({"ok": true, "errors": []}));
    write_file(root, &format!("renders/{shot}/preview.mp4"), format!("frames of {shot}").as_bytes());
}

/// Writes a strict project file.
pub fn write_strict_project(root: &Path, project: &str, qc: Option<Value>) {
    let mut value = json!({
        "id": project,
        "policy": {
            "hash_alg": "sha256",
            "path_mode": "relative",
            "immutable_outputs": true,
            "done_requires_manifest": true
        }
    });
    if let Some(qc) = qc {
        value["qc"] = qc;
    }
    write_json(root, &format!("projects/{project}/project.json"), &value);
}

// ============================================================================
// SECTION: Documents
// ============================================================================

/// Builds a shot with `status` whose outputs point at passing files.
#[must_use]
pub fn shot_with_outputs(id: &str, phase: &str, status: ShotStatus) -> Shot {
    let mut shot = Shot::planned(ShotId::new(id), phase, format!("prompt for {id}"), t0(), "tester");
    shot.status = status;
    shot.outputs.insert("qc.json".to_string(), format!("renders/{id}/qc.json"));
    shot.outputs.insert("preview.mp4".to_string(), format!("renders/{id}/preview.mp4"));
    shot
}

/// Builds a document holding `shots`.
#[must_use]
pub fn document_with(project: &str, shots: Vec<Shot>) -> StateDocument {
    let mut document = StateDocument::new(project, t0());
    for shot in shots {
        document.shots.insert(shot.id.as_str().to_string(), shot);
    }
    document
}

/// Writes a document as the state file under `root`.
pub fn write_document(root: &Path, document: &StateDocument) {
    let mut bytes = serde_json::to_vec_pretty(document).unwrap();
    bytes.push(b'\n');
    fs::write(root.join("state.json"), bytes).unwrap();
}

/// Lists every file under `root`, relative and sorted.
#[must_use]
pub fn tree_listing(root: &Path) -> Vec<String> {
    let mut out = Vec::new();
    collect(root, root, &mut out);
    out.sort();
    out
}

fn collect(root: &Path, dir: &Path, out: &mut Vec<String>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect(root, &path, out);
        } else {
            out.push(path.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"));
        }
    }
}

// ============================================================================
// SECTION: Gates
// ============================================================================

/// Gate that always passes.
pub struct OpenGate;

impl ReleaseGate for OpenGate {
    fn check(
        &self,
        _project_id: &ProjectId,
        _release_id: &ReleaseId,
        _at: UtcTimestamp,
    ) -> Result<(), PipelineError> {
        Ok(())
    }
}

/// Gate that always refuses with a policy violation.
pub struct ClosedGate;

impl ReleaseGate for ClosedGate {
    fn check(
        &self,
        project_id: &ProjectId,
        _release_id: &ReleaseId,
        _at: UtcTimestamp,
    ) -> Result<(), PipelineError> {
        Err(PipelineError::PolicyViolation(format!("project {project_id} is frozen")))
    }
}

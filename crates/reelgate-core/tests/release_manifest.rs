// crates/reelgate-core/tests/release_manifest.rs
// ============================================================================
// Module: Release Manifest Tests
// Description: Release builds, artifact manifests, and offline verification.
// ============================================================================
//! ## Overview
//! Builds releases from state documents on disk, then verifies, tampers with,
//! and rebuilds them to check write-once and determinism guarantees.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::fs;
use std::path::Path;

use reelgate_core::ErrorKind;
use reelgate_core::HashAlgorithm;
use reelgate_core::MemoryAuditSink;
use reelgate_core::NoopAuditSink;
use reelgate_core::ReleaseBuilder;
use reelgate_core::ReleaseId;
use reelgate_core::ReleaseRequest;
use reelgate_core::ShotStatus;
use reelgate_core::StateDocument;
use reelgate_core::core::hashing::hash_bytes;
use reelgate_core::runtime::verifier::IssueKind;
use reelgate_core::runtime::verifier::ManifestVerifier;
use serde_json::Value;
use serde_json::json;

use crate::common::at;
use crate::common::document_with;
use crate::common::shot_with_outputs;
use crate::common::tree_listing;
use crate::common::write_file;
use crate::common::write_passing_outputs;

fn two_shot_tree(root: &Path) -> StateDocument {
    write_passing_outputs(root, "S1");
    document_with(
        "demo01",
        vec![
            shot_with_outputs("S1", "FAZ_1", ShotStatus::Done),
            shot_with_outputs("S2", "FAZ_1", ShotStatus::Planned),
        ],
    )
}

fn release_request(root: &Path, release: &str) -> ReleaseRequest {
    ReleaseRequest {
        release_id: ReleaseId::new(release),
        project_id: None,
        releases_root: root.join("releases"),
        created_utc: at("2026-03-05T08:00:00Z"),
    }
}

#[test]
fn release_round_trip_covers_only_done_shots() {
    let dir = tempfile::tempdir().unwrap();
    let document = two_shot_tree(dir.path());
    let audit = MemoryAuditSink::new();
    let builder = ReleaseBuilder::new(&audit, HashAlgorithm::Sha256);
    let built = builder
        .build_release(&document, dir.path(), &release_request(dir.path(), "R1"))
        .unwrap();

    let manifest = &built.manifest;
    assert_eq!(manifest.manifest_version, 1);
    assert_eq!(manifest.hash_alg, "sha256");
    assert_eq!(manifest.shots.len(), 1);
    let shot = &manifest.shots[0];
    assert_eq!(shot.shot_id.as_str(), "S1");
    let paths: Vec<&str> = shot.files.iter().map(|file| file.path.as_str()).collect();
    assert_eq!(paths, vec!["S1/preview.mp4", "S1/qc.json"]);
    let preview = fs::read(dir.path().join("renders/S1/preview.mp4")).unwrap();
    assert_eq!(shot.files[0].sha256, hash_bytes(&preview));
    assert_eq!(shot.files[0].bytes, u64::try_from(preview.len()).unwrap());
    assert_eq!(shot.files[0].source, "renders/S1/preview.mp4");
    assert_eq!(manifest.totals.total_shots, 1);
    assert_eq!(manifest.totals.total_files, 2);
    assert_eq!(audit.names(), vec!["release_built"]);

    let verified = ManifestVerifier::default().verify_file(&built.manifest_path, dir.path()).unwrap();
    assert!(verified.report.is_pass());
    assert_eq!(verified.report.checked_files, 2);
}

#[test]
fn existing_release_directory_is_refused_without_changes() {
    let dir = tempfile::tempdir().unwrap();
    let document = two_shot_tree(dir.path());
    write_file(dir.path(), "releases/R1/notes.txt", b"keep me");
    let before = tree_listing(dir.path());

    let err = ReleaseBuilder::new(NoopAuditSink, HashAlgorithm::Sha256)
        .build_release(&document, dir.path(), &release_request(dir.path(), "R1"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert_eq!(tree_listing(dir.path()), before);
    assert_eq!(fs::read(dir.path().join("releases/R1/notes.txt")).unwrap(), b"keep me");
}

#[test]
fn invalid_documents_never_create_a_release_directory() {
    let dir = tempfile::tempdir().unwrap();
    let builder = ReleaseBuilder::new(NoopAuditSink, HashAlgorithm::Sha256);
    let request = release_request(dir.path(), "R1");

    let nothing_done =
        document_with("demo01", vec![shot_with_outputs("S2", "FAZ_1", ShotStatus::Qc)]);
    let err = builder.build_release(&nothing_done, dir.path(), &request).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Invalid);
    assert!(err.to_string().contains("no DONE shots"));

    let mut lacking = shot_with_outputs("S1", "FAZ_1", ShotStatus::Done);
    lacking.outputs.remove("qc.json");
    let err = builder
        .build_release(&document_with("demo01", vec![lacking]), dir.path(), &request)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Invalid);

    let missing_files =
        document_with("demo01", vec![shot_with_outputs("S1", "FAZ_1", ShotStatus::Done)]);
    let err = builder.build_release(&missing_files, dir.path(), &request).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert!(!dir.path().join("releases").exists());
}

#[test]
fn outputs_released_under_one_name_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_passing_outputs(dir.path(), "S1");
    write_file(dir.path(), "renders/S1/alternate.mp4", b"alternate frames");
    let mut shot = shot_with_outputs("S1", "FAZ_1", ShotStatus::Done);
    shot.outputs.insert("preview".to_string(), "renders/S1/alternate.mp4".to_string());
    let document = document_with("demo01", vec![shot]);

    let err = ReleaseBuilder::new(NoopAuditSink, HashAlgorithm::Sha256)
        .build_release(&document, dir.path(), &release_request(dir.path(), "R1"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Invalid);
    assert!(err.to_string().contains("preview.mp4"));
    assert!(!dir.path().join("releases").exists());
}

#[test]
fn identical_inputs_produce_identical_manifest_bytes() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let builder = ReleaseBuilder::new(NoopAuditSink, HashAlgorithm::Sha256);
    let a = builder
        .build_release(&two_shot_tree(first.path()), first.path(), &release_request(first.path(), "R1"))
        .unwrap();
    let b = builder
        .build_release(&two_shot_tree(second.path()), second.path(), &release_request(second.path(), "R1"))
        .unwrap();
    assert_eq!(fs::read(a.manifest_path).unwrap(), fs::read(b.manifest_path).unwrap());
}

#[test]
fn tampered_release_fails_verification_with_hash_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let document = two_shot_tree(dir.path());
    let built = ReleaseBuilder::new(NoopAuditSink, HashAlgorithm::Sha256)
        .build_release(&document, dir.path(), &release_request(dir.path(), "R1"))
        .unwrap();
    let verifier = ManifestVerifier::default();
    assert!(verifier.verify_file(&built.manifest_path, dir.path()).is_ok());

    fs::write(built.release_dir.join("S1/preview.mp4"), b"frames of S9").unwrap();
    let (_, report) = verifier.inspect_file(&built.manifest_path, dir.path()).unwrap();
    assert!(!report.is_pass());
    let kinds: Vec<IssueKind> = report.issues.iter().map(|issue| issue.kind).collect();
    assert_eq!(kinds, vec![IssueKind::HashMismatch]);
    let err = verifier.verify_file(&built.manifest_path, dir.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IntegrityMismatch);

    fs::remove_file(built.release_dir.join("S1/qc.json")).unwrap();
    let err = verifier.verify_file(&built.manifest_path, dir.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn verification_collects_every_problem_in_one_report() {
    let dir = tempfile::tempdir().unwrap();
    let document = two_shot_tree(dir.path());
    let built = ReleaseBuilder::new(NoopAuditSink, HashAlgorithm::Sha256)
        .build_release(&document, dir.path(), &release_request(dir.path(), "R1"))
        .unwrap();
    fs::write(built.release_dir.join("S1/preview.mp4"), b"longer frames of S1").unwrap();
    fs::remove_file(built.release_dir.join("S1/qc.json")).unwrap();

    let verifier = ManifestVerifier::default();
    let (_, report) = verifier.inspect_file(&built.manifest_path, dir.path()).unwrap();
    let kinds: Vec<IssueKind> = report.issues.iter().map(|issue| issue.kind).collect();
    assert_eq!(kinds, vec![IssueKind::SizeMismatch, IssueKind::HashMismatch, IssueKind::Missing]);
    assert_eq!(report.checked_files, 0);
    assert_eq!(report.issues[0].path.as_deref(), Some("S1/preview.mp4"));
    assert_eq!(report.issues[2].path.as_deref(), Some("S1/qc.json"));
}

#[test]
fn repeated_verification_yields_identical_reports() {
    let dir = tempfile::tempdir().unwrap();
    let document = two_shot_tree(dir.path());
    let built = ReleaseBuilder::new(NoopAuditSink, HashAlgorithm::Sha256)
        .build_release(&document, dir.path(), &release_request(dir.path(), "R1"))
        .unwrap();
    let verifier = ManifestVerifier::default();
    let (_, clean_first) = verifier.inspect_file(&built.manifest_path, dir.path()).unwrap();
    let (_, clean_second) = verifier.inspect_file(&built.manifest_path, dir.path()).unwrap();
    assert!(clean_first.is_pass());
    assert_eq!(clean_first, clean_second);

    fs::write(built.release_dir.join("S1/preview.mp4"), b"frames of S9").unwrap();
    let listing = tree_listing(dir.path());
    let (_, failed_first) = verifier.inspect_file(&built.manifest_path, dir.path()).unwrap();
    let (_, failed_second) = verifier.inspect_file(&built.manifest_path, dir.path()).unwrap();
    assert!(!failed_first.is_pass());
    assert_eq!(failed_first, failed_second);
    assert_eq!(tree_listing(dir.path()), listing);
}

#[test]
fn escaping_and_unknown_manifests_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let document = two_shot_tree(dir.path());
    let built = ReleaseBuilder::new(NoopAuditSink, HashAlgorithm::Sha256)
        .build_release(&document, dir.path(), &release_request(dir.path(), "R1"))
        .unwrap();
    let verifier = ManifestVerifier::default();

    let mut value: Value = serde_json::from_slice(&fs::read(&built.manifest_path).unwrap()).unwrap();
    value["shots"][0]["files"][0]["path"] = json!("../../renders/S1/preview.mp4");
    fs::write(&built.manifest_path, serde_json::to_vec(&value).unwrap()).unwrap();
    let err = verifier.verify_file(&built.manifest_path, dir.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsafePath);

    value["manifest_version"] = json!(7);
    fs::write(&built.manifest_path, serde_json::to_vec(&value).unwrap()).unwrap();
    let (manifest, report) = verifier.inspect_file(&built.manifest_path, dir.path()).unwrap();
    assert!(manifest.is_none());
    assert_eq!(report.issues[0].kind, IssueKind::UnsupportedVersion);
    let err = verifier.verify_file(&built.manifest_path, dir.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);

    value["manifest_version"] = json!(1);
    value["hash_alg"] = json!("md5");
    fs::write(&built.manifest_path, serde_json::to_vec(&value).unwrap()).unwrap();
    let err = verifier.verify_file(&built.manifest_path, dir.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
}

#[test]
fn artifact_manifest_lists_required_outputs_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let mut document = two_shot_tree(dir.path());
    write_passing_outputs(dir.path(), "S3");
    let mut extra = shot_with_outputs("S3", "FAZ_1", ShotStatus::Done);
    extra.outputs.insert("notes".to_string(), "renders/S3/qc.json".to_string());
    document.shots.insert("S3".to_string(), extra);

    let built = ReleaseBuilder::new(NoopAuditSink, HashAlgorithm::Sha256)
        .build_artifact_manifest(&document, dir.path(), &release_request(dir.path(), "R2"))
        .unwrap();
    let paths: Vec<&str> =
        built.manifest.artifacts.iter().map(|artifact| artifact.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "renders/S1/preview.mp4",
            "renders/S1/qc.json",
            "renders/S3/preview.mp4",
            "renders/S3/qc.json",
        ]
    );
    assert_eq!(built.manifest.manifest_version, 2);
    assert_eq!(built.manifest.totals.total_shots, 2);
    assert!(!dir.path().join("releases/R2/S1").exists());

    let verified = ManifestVerifier::default().verify_file(&built.manifest_path, dir.path()).unwrap();
    assert_eq!(verified.report.checked_files, 4);

    let err = ReleaseBuilder::new(NoopAuditSink, HashAlgorithm::Sha256)
        .build_artifact_manifest(&document, dir.path(), &release_request(dir.path(), "R2"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
}

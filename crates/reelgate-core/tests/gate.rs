// crates/reelgate-core/tests/gate.rs
// ============================================================================
// Module: Release Gate Tests
// Description: Policy enforcement, manifest verification, and QC re-checks.
// ============================================================================
//! ## Overview
//! Evaluates the release gate against real project trees and checks that it
//! fails closed on missing policy, weak policy, unsafe overrides, and
//! released QC reports that no longer pass.

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

use std::path::Path;

use reelgate_core::AuditEvent;
use reelgate_core::ErrorKind;
use reelgate_core::FileStateStore;
use reelgate_core::GateLayout;
use reelgate_core::GateRequest;
use reelgate_core::HashAlgorithm;
use reelgate_core::MemoryAuditSink;
use reelgate_core::NoopAuditSink;
use reelgate_core::PolicyGate;
use reelgate_core::ProjectId;
use reelgate_core::PromoteRequest;
use reelgate_core::PromoteSelection;
use reelgate_core::QcPolicy;
use reelgate_core::ReleaseBuilder;
use reelgate_core::ReleaseId;
use reelgate_core::ReleaseRequest;
use reelgate_core::ShotId;
use reelgate_core::ShotStateMachine;
use reelgate_core::ShotStatus;
use reelgate_core::StateDocumentStore;
use reelgate_core::StructuralQcValidator;
use serde_json::json;

use crate::common::at;
use crate::common::document_with;
use crate::common::shot_with_outputs;
use crate::common::write_document;
use crate::common::write_json;
use crate::common::write_passing_outputs;
use crate::common::write_strict_project;

fn build_release(root: &Path, phase: &str) {
    write_passing_outputs(root, "SH001");
    let document = document_with("demo01", vec![shot_with_outputs("SH001", phase, ShotStatus::Done)]);
    write_document(root, &document);
    ReleaseBuilder::new(NoopAuditSink, HashAlgorithm::Sha256)
        .build_release(
            &document,
            root,
            &ReleaseRequest {
                release_id: ReleaseId::new("R1"),
                project_id: Some(ProjectId::new("demo01")),
                releases_root: root.join("releases"),
                created_utc: at("2026-03-05T08:00:00Z"),
            },
        )
        .unwrap();
}

fn gate_request(release: &str) -> GateRequest {
    GateRequest {
        project_id: ProjectId::new("demo01"),
        release_id: ReleaseId::new(release),
        project_file: None,
        manifest: None,
        at: at("2026-03-05T09:00:00Z"),
    }
}

#[test]
fn strict_policy_and_verified_manifest_pass() {
    let dir = tempfile::tempdir().unwrap();
    build_release(dir.path(), "FAZ_1");
    write_strict_project(dir.path(), "demo01", None);
    let audit = MemoryAuditSink::new();
    let gate = PolicyGate::new(GateLayout::new(dir.path()), StructuralQcValidator, &audit);

    let report = gate.evaluate(&gate_request("R1")).unwrap();
    assert!(report.verification.is_pass());
    assert_eq!(report.qc_rechecked, 0);
    assert!(matches!(
        audit.events().as_slice(),
        [AuditEvent::GateEvaluated { passed: true, reason: None, .. }]
    ));
}

#[test]
fn weak_or_missing_policy_is_a_violation() {
    let dir = tempfile::tempdir().unwrap();
    build_release(dir.path(), "FAZ_1");
    let audit = MemoryAuditSink::new();
    let gate = PolicyGate::new(GateLayout::new(dir.path()), StructuralQcValidator, &audit);

    let err = gate.evaluate(&gate_request("R1")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    write_json(
        dir.path(),
        "projects/demo01/project.json",
        &json!({"policy": {"hash_alg": "sha256", "path_mode": "absolute", "immutable_outputs": true}}),
    );
    let err = gate.evaluate(&gate_request("R1")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PolicyViolation);
    let message = err.to_string();
    assert!(message.contains("path_mode"));
    assert!(message.contains("done_requires_manifest"));

    assert!(matches!(
        audit.events().last(),
        Some(AuditEvent::GateEvaluated { passed: false, reason: Some(_), .. })
    ));
}

#[test]
fn overrides_must_stay_inside_the_repository() {
    let dir = tempfile::tempdir().unwrap();
    build_release(dir.path(), "FAZ_1");
    write_strict_project(dir.path(), "demo01", None);
    let gate = PolicyGate::new(GateLayout::new(dir.path()), StructuralQcValidator, NoopAuditSink);

    let mut request = gate_request("R1");
    request.manifest = Some("../elsewhere/manifest.json".to_string());
    assert_eq!(gate.evaluate(&request).unwrap_err().kind(), ErrorKind::UnsafePath);

    let mut request = gate_request("R2");
    request.manifest = Some("releases/R1/manifest.json".to_string());
    assert_eq!(gate.evaluate(&request).unwrap_err().kind(), ErrorKind::PolicyViolation);

    let err = gate.evaluate(&gate_request("R9")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn released_qc_reports_are_rechecked_for_passive_phases() {
    let dir = tempfile::tempdir().unwrap();
    build_release(dir.path(), "FAZ_2");
    write_strict_project(dir.path(), "demo01", Some(json!({"passive_check_phases": ["FAZ_2"]})));
    let gate = PolicyGate::new(GateLayout::new(dir.path()), StructuralQcValidator, NoopAuditSink);

    let err = gate.evaluate(&gate_request("R1")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PolicyViolation);
    assert!(err.to_string().contains("passive_check_status"));

    write_strict_project(dir.path(), "demo01", Some(json!({"passive_check_phases": ["FAZ_9"]})));
    assert_eq!(gate.evaluate(&gate_request("R1")).unwrap().qc_rechecked, 0);
}

#[test]
fn promotion_runs_the_gate_once_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    build_release(dir.path(), "FAZ_1");
    let audit = MemoryAuditSink::new();
    let machine = ShotStateMachine::new(
        FileStateStore::new(dir.path().join("state.json")),
        StructuralQcValidator,
        PolicyGate::new(GateLayout::new(dir.path()), StructuralQcValidator, &audit),
        NoopAuditSink,
        QcPolicy::default(),
    );
    let request = PromoteRequest {
        release_id: ReleaseId::new("R1"),
        project_id: None,
        selection: PromoteSelection::AllDone,
        actor: "tester".to_string(),
        at: at("2026-03-05T10:00:00Z"),
        note: None,
    };
    let err = machine.promote(&request).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let document = machine.store().load().unwrap();
    assert_eq!(document.shot(&ShotId::new("SH001")).unwrap().status, ShotStatus::Done);

    write_strict_project(dir.path(), "demo01", None);
    let outcome = machine.promote(&request).unwrap();
    assert_eq!(outcome.promoted, vec![ShotId::new("SH001")]);
    assert_eq!(audit.names(), vec!["gate_evaluated", "gate_evaluated"]);
    let document = machine.store().load().unwrap();
    let shot = document.shot(&ShotId::new("SH001")).unwrap();
    assert_eq!(shot.status, ShotStatus::Release);
    assert_eq!(shot.release, Some(ReleaseId::new("R1")));
}

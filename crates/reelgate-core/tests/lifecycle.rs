// crates/reelgate-core/tests/lifecycle.rs
// ============================================================================
// Module: Shot Lifecycle Tests
// Description: End-to-end transitions over a state document on disk.
// ============================================================================
//! ## Overview
//! Drives a shot from creation to release through the file-backed store and
//! checks that rejected transitions leave the document byte-identical.

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

use reelgate_core::AttachOutputRequest;
use reelgate_core::ErrorKind;
use reelgate_core::FileStateStore;
use reelgate_core::HistoryEventKind;
use reelgate_core::MemoryAuditSink;
use reelgate_core::NewShotRequest;
use reelgate_core::NoopAuditSink;
use reelgate_core::PromoteRequest;
use reelgate_core::PromoteSelection;
use reelgate_core::QcPolicy;
use reelgate_core::ReleaseId;
use reelgate_core::RenderRequest;
use reelgate_core::ShotFilter;
use reelgate_core::ShotId;
use reelgate_core::ShotStateMachine;
use reelgate_core::ShotStatus;
use reelgate_core::ShotTracker;
use reelgate_core::StateDocument;
use reelgate_core::StateDocumentStore;
use reelgate_core::StructuralQcValidator;
use reelgate_core::TransitionRequest;
use serde_json::json;

use crate::common::ClosedGate;
use crate::common::OpenGate;
use crate::common::at;
use crate::common::document_with;
use crate::common::shot_with_outputs;
use crate::common::t0;
use crate::common::write_document;
use crate::common::write_file;
use crate::common::write_json;
use crate::common::write_passing_outputs;

fn request(shot: &str, to: ShotStatus, stamp: &str) -> TransitionRequest {
    TransitionRequest {
        shot_id: ShotId::new(shot),
        to,
        actor: "tester".to_string(),
        at: at(stamp),
        release_id: None,
        project_id: None,
        note: None,
    }
}

fn attach(shot: &str, key: &str, path: &str) -> AttachOutputRequest {
    AttachOutputRequest {
        shot_id: ShotId::new(shot),
        key: key.to_string(),
        path: path.to_string(),
        actor: "tester".to_string(),
        at: t0(),
        note: None,
    }
}

#[test]
fn shot_travels_from_planned_to_release() {
    let dir = tempfile::tempdir().unwrap();
    write_document(dir.path(), &StateDocument::new("demo01", t0()));
    write_passing_outputs(dir.path(), "SH001");
    let state_path = dir.path().join("state.json");

    let tracker = ShotTracker::new(FileStateStore::new(&state_path), NoopAuditSink, true);
    tracker
        .create_shot(&NewShotRequest {
            shot_id: ShotId::new("SH001"),
            phase: String::new(),
            prompt: "a lighthouse at dusk".to_string(),
            actor: "tester".to_string(),
            at: t0(),
        })
        .unwrap();
    tracker.attach_output(&attach("SH001", "qc.json", "renders/SH001/qc.json")).unwrap();
    tracker
        .attach_output(&attach("SH001", "preview.mp4", "renders/SH001/preview.mp4"))
        .unwrap();

    let audit = MemoryAuditSink::new();
    let machine = ShotStateMachine::new(
        FileStateStore::new(&state_path),
        StructuralQcValidator,
        OpenGate,
        &audit,
        QcPolicy::default(),
    );
    machine.transition(&request("SH001", ShotStatus::InProgress, "2026-03-01T10:00:00Z")).unwrap();
    machine.transition(&request("SH001", ShotStatus::Qc, "2026-03-01T11:00:00Z")).unwrap();
    machine.transition(&request("SH001", ShotStatus::Done, "2026-03-01T12:00:00Z")).unwrap();
    let mut promote = request("SH001", ShotStatus::Release, "2026-03-01T13:00:00Z");
    promote.release_id = Some(ReleaseId::new("R1"));
    let outcome = machine.transition(&promote).unwrap();
    assert_eq!(outcome.release_id, Some(ReleaseId::new("R1")));

    let document = machine.store().load().unwrap();
    let shot = document.shot(&ShotId::new("SH001")).unwrap();
    assert_eq!(shot.status, ShotStatus::Release);
    assert_eq!(shot.phase, "FAZ_1");
    assert_eq!(shot.release, Some(ReleaseId::new("R1")));
    let changes: Vec<_> = shot
        .history
        .iter()
        .filter(|entry| entry.event == HistoryEventKind::StatusChanged)
        .map(|entry| (entry.from.unwrap(), entry.to.unwrap()))
        .collect();
    assert_eq!(
        changes,
        vec![
            (ShotStatus::Planned, ShotStatus::InProgress),
            (ShotStatus::InProgress, ShotStatus::Qc),
            (ShotStatus::Qc, ShotStatus::Done),
            (ShotStatus::Done, ShotStatus::Release),
        ]
    );
    assert_eq!(document.last_updated_utc, at("2026-03-01T13:00:00Z"));
    assert_eq!(audit.names(), vec!["status_changed"; 4]);
}

#[test]
fn rejected_transition_leaves_state_file_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let mut planned = shot_with_outputs("SH001", "FAZ_1", ShotStatus::Planned);
    planned.outputs.clear();
    write_document(dir.path(), &document_with("demo01", vec![planned]));
    let state_path = dir.path().join("state.json");
    let before = fs::read(&state_path).unwrap();

    let audit = MemoryAuditSink::new();
    let machine = ShotStateMachine::new(
        FileStateStore::new(&state_path),
        StructuralQcValidator,
        OpenGate,
        &audit,
        QcPolicy::default(),
    );
    let err = machine.transition(&request("SH001", ShotStatus::Done, "2026-03-02T00:00:00Z")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    let err = machine.transition(&request("SH404", ShotStatus::InProgress, "2026-03-02T00:00:00Z")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert_eq!(fs::read(&state_path).unwrap(), before);
    assert_eq!(audit.names(), vec!["transition_rejected", "transition_rejected"]);
}

#[test]
fn qc_guard_requires_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let mut shot = shot_with_outputs("SH001", "FAZ_1", ShotStatus::InProgress);
    shot.outputs.clear();
    write_document(dir.path(), &document_with("demo01", vec![shot]));
    let machine = ShotStateMachine::new(
        FileStateStore::new(dir.path().join("state.json")),
        StructuralQcValidator,
        OpenGate,
        NoopAuditSink,
        QcPolicy::default(),
    );
    let err = machine.transition(&request("SH001", ShotStatus::Qc, "2026-03-02T00:00:00Z")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::GuardFailed);
    assert!(err.to_string().contains("requires non-empty outputs"));
}

#[test]
fn done_guard_reports_missing_and_failing_evidence() {
    let dir = tempfile::tempdir().unwrap();
    write_document(
        dir.path(),
        &document_with("demo01", vec![shot_with_outputs("SH001", "FAZ_2", ShotStatus::Qc)]),
    );
    let machine = ShotStateMachine::new(
        FileStateStore::new(dir.path().join("state.json")),
        StructuralQcValidator,
        OpenGate,
        NoopAuditSink,
        QcPolicy {
            passive_check_phases: vec!["FAZ_2".to_string()],
            ..QcPolicy::default()
        },
    );
    let done = request("SH001", ShotStatus::Done, "2026-03-02T00:00:00Z");

    let err = machine.transition(&done).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::GuardFailed);
    assert!(err.to_string().contains("file to exist on disk: renders/SH001/qc.json"));

    write_passing_outputs(dir.path(), "SH001");
    let err = machine.transition(&done).unwrap_err();
    assert!(err.to_string().contains("metrics.passive_check_status == PASS"));

    write_json(
        dir.path(),
        "renders/SH001/qc.json",
        &json!({"ok": true, "errors": [], "metrics": {"passive_check_status": "PASS"}}),
    );
    machine.transition(&done).unwrap();
}

#[test]
fn release_guard_requires_release_id_and_gate() {
    let document = document_with("demo01", vec![shot_with_outputs("SH001", "FAZ_1", ShotStatus::Done)]);
    let dir = tempfile::tempdir().unwrap();
    write_document(dir.path(), &document);
    let state_path = dir.path().join("state.json");

    let open = ShotStateMachine::new(
        FileStateStore::new(&state_path),
        StructuralQcValidator,
        OpenGate,
        NoopAuditSink,
        QcPolicy::default(),
    );
    let err = open.transition(&request("SH001", ShotStatus::Release, "2026-03-02T00:00:00Z")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::GuardFailed);
    assert!(err.to_string().contains("requires a release id"));

    let closed = ShotStateMachine::new(
        FileStateStore::new(&state_path),
        StructuralQcValidator,
        ClosedGate,
        NoopAuditSink,
        QcPolicy::default(),
    );
    let mut promote = request("SH001", ShotStatus::Release, "2026-03-02T00:00:00Z");
    promote.release_id = Some(ReleaseId::new("R1"));
    let err = closed.transition(&promote).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PolicyViolation);

    let mut with_default = document;
    with_default.active_release = Some(ReleaseId::new("R7"));
    write_document(dir.path(), &with_default);
    let outcome = open.transition(&request("SH001", ShotStatus::Release, "2026-03-02T00:00:00Z")).unwrap();
    assert_eq!(outcome.release_id, Some(ReleaseId::new("R7")));
}

#[test]
fn terminal_shots_refuse_every_target() {
    let dir = tempfile::tempdir().unwrap();
    write_document(
        dir.path(),
        &document_with(
            "demo01",
            vec![
                shot_with_outputs("SH001", "FAZ_1", ShotStatus::Release),
                shot_with_outputs("SH002", "FAZ_1", ShotStatus::Fail),
            ],
        ),
    );
    let machine = ShotStateMachine::new(
        FileStateStore::new(dir.path().join("state.json")),
        StructuralQcValidator,
        OpenGate,
        NoopAuditSink,
        QcPolicy::default(),
    );
    for shot in ["SH001", "SH002"] {
        for to in ShotStatus::ALL {
            let err = machine.transition(&request(shot, to, "2026-03-02T00:00:00Z")).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidTransition, "{shot} -> {to}");
        }
    }
}

#[test]
fn promote_moves_done_shots_once_and_skips_released() {
    let dir = tempfile::tempdir().unwrap();
    write_document(
        dir.path(),
        &document_with(
            "demo01",
            vec![
                shot_with_outputs("SH001", "FAZ_1", ShotStatus::Done),
                shot_with_outputs("SH002", "FAZ_1", ShotStatus::Release),
                shot_with_outputs("SH003", "FAZ_1", ShotStatus::Qc),
            ],
        ),
    );
    let state_path = dir.path().join("state.json");
    let machine = ShotStateMachine::new(
        FileStateStore::new(&state_path),
        StructuralQcValidator,
        OpenGate,
        NoopAuditSink,
        QcPolicy::default(),
    );
    let mut promote = PromoteRequest {
        release_id: ReleaseId::new("R1"),
        project_id: None,
        selection: PromoteSelection::Shots(vec![ShotId::new("SH001"), ShotId::new("SH003")]),
        actor: "tester".to_string(),
        at: at("2026-03-02T00:00:00Z"),
        note: None,
    };
    let before = fs::read(&state_path).unwrap();
    let err = machine.promote(&promote).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    assert_eq!(fs::read(&state_path).unwrap(), before);

    promote.selection = PromoteSelection::Shots(vec![ShotId::new("SH001"), ShotId::new("SH002")]);
    let outcome = machine.promote(&promote).unwrap();
    assert_eq!(outcome.promoted, vec![ShotId::new("SH001")]);
    assert_eq!(outcome.already_released, vec![ShotId::new("SH002")]);

    let listing = ShotTracker::new(FileStateStore::new(&state_path), NoopAuditSink, true)
        .list_shots(&ShotFilter {
            status: Some(ShotStatus::Release),
            phase: None,
        })
        .unwrap();
    assert_eq!(listing.rows.len(), 2);
    assert_eq!(listing.total, 3);
    assert_eq!(listing.done, 0);
}

#[test]
fn done_outputs_are_frozen_under_immutable_policy() {
    let dir = tempfile::tempdir().unwrap();
    write_document(
        dir.path(),
        &document_with("demo01", vec![shot_with_outputs("SH001", "FAZ_1", ShotStatus::Done)]),
    );
    let state_path = dir.path().join("state.json");
    let frozen = ShotTracker::new(FileStateStore::new(&state_path), NoopAuditSink, true);
    let err = frozen.attach_output(&attach("SH001", "qc.json", "renders/other/qc.json")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PolicyViolation);
    let unchanged = frozen.attach_output(&attach("SH001", "qc.json", "renders/SH001/qc.json")).unwrap();
    assert!(!unchanged.changed);

    let err = frozen.attach_output(&attach("SH001", "qc.json", "../escape/qc.json")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsafePath);

    let relaxed = ShotTracker::new(FileStateStore::new(&state_path), NoopAuditSink, false);
    assert!(relaxed.attach_output(&attach("SH001", "qc.json", "renders/other/qc.json")).unwrap().changed);
}

fn render(shot: &str, source: &std::path::Path) -> RenderRequest {
    RenderRequest {
        shot_id: ShotId::new(shot),
        source: source.to_path_buf(),
        out_dir: format!("renders/{shot}"),
        actor: "tester".to_string(),
        at: at("2026-03-02T10:00:00Z"),
    }
}

#[test]
fn done_preview_cannot_be_rerendered_under_immutable_policy() {
    let dir = tempfile::tempdir().unwrap();
    write_passing_outputs(dir.path(), "SH001");
    write_document(
        dir.path(),
        &document_with("demo01", vec![shot_with_outputs("SH001", "FAZ_1", ShotStatus::Done)]),
    );
    write_file(dir.path(), "incoming/take2.mp4", b"different frames");
    write_file(dir.path(), "incoming/same.mp4", b"frames of SH001");
    let state_path = dir.path().join("state.json");
    let preview = dir.path().join("renders/SH001/preview.mp4");
    let state_before = fs::read(&state_path).unwrap();

    let frozen = ShotTracker::new(FileStateStore::new(&state_path), NoopAuditSink, true);
    let err = frozen.render(&render("SH001", &dir.path().join("incoming/take2.mp4"))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PolicyViolation);
    assert_eq!(fs::read(&preview).unwrap(), b"frames of SH001");
    assert_eq!(fs::read(&state_path).unwrap(), state_before);

    let same = frozen.render(&render("SH001", &dir.path().join("incoming/same.mp4"))).unwrap();
    assert!(!same.changed);
    assert_eq!(fs::read(&state_path).unwrap(), state_before);
}

#[test]
fn rerender_behind_unchanged_path_is_recorded_in_history() {
    let dir = tempfile::tempdir().unwrap();
    write_passing_outputs(dir.path(), "SH001");
    write_document(
        dir.path(),
        &document_with("demo01", vec![shot_with_outputs("SH001", "FAZ_1", ShotStatus::Done)]),
    );
    write_file(dir.path(), "incoming/take2.mp4", b"different frames");
    let state_path = dir.path().join("state.json");
    let store = FileStateStore::new(&state_path);
    let history_before = store.load().unwrap().shots["SH001"].history.len();

    let relaxed = ShotTracker::new(FileStateStore::new(&state_path), NoopAuditSink, false);
    let outcome = relaxed.render(&render("SH001", &dir.path().join("incoming/take2.mp4"))).unwrap();
    assert!(outcome.changed);
    assert_eq!(outcome.path, "renders/SH001/preview.mp4");
    assert_eq!(fs::read(dir.path().join("renders/SH001/preview.mp4")).unwrap(), b"different frames");

    let shot = store.load().unwrap().shots["SH001"].clone();
    assert_eq!(shot.history.len(), history_before + 1);
    assert_eq!(shot.history.last().unwrap().event, HistoryEventKind::Rendered);
    assert_eq!(shot.output("preview.mp4"), Some("renders/SH001/preview.mp4"));
}

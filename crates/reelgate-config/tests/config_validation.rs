// crates/reelgate-config/tests/config_validation.rs
// =============================================================================
// Module: Config Validation Tests
// Description: Defaults, path rules, audit sinks, and unknown keys.
// Purpose: Ensure every reelgate.toml section fails closed on bad input.
// =============================================================================
//! ## Overview
//! Parses small TOML documents and checks the validated model.

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

use reelgate_config::AuditSinkKind;
use reelgate_config::ReelgateConfig;
use reelgate_core::AuditEvent;
use reelgate_core::ConflictPolicy;
use reelgate_core::ShotId;
use reelgate_core::UtcTimestamp;

use crate::common::assert_invalid;
use crate::common::config_from_toml;

#[test]
fn empty_file_yields_defaults() {
    let config = config_from_toml("").unwrap();
    assert_eq!(config, ReelgateConfig::default());
    assert_eq!(config.paths.releases_dir, "releases");
    assert_eq!(config.paths.projects_dir, "projects");
    assert_eq!(config.audit.sink, AuditSinkKind::Stderr);
    assert_eq!(config.actor.name, "cli");
    assert_eq!(config.bundle.conflict_policy, ConflictPolicy::Fail);
}

#[test]
fn full_file_parses() {
    let config = config_from_toml(
        r#"
[paths]
releases_dir = "out/releases"
projects_dir = "meta/projects"
[audit]
sink = "file"
path = "logs/audit.jsonl"
[actor]
name = "editor"
[bundle]
conflict_policy = "latest"
"#,
    )
    .unwrap();
    assert_eq!(config.audit.sink, AuditSinkKind::File);
    assert_eq!(config.bundle.conflict_policy, ConflictPolicy::Latest);
    let layout = config.gate_layout(Path::new("/repo"));
    assert_eq!(layout.projects_dir, "meta/projects");
    assert_eq!(config.paths.releases_root(Path::new("/repo")), Path::new("/repo/out/releases"));
}

#[test]
fn paths_must_stay_relative() {
    assert_invalid(config_from_toml("[paths]\nreleases_dir = \"/tmp/r\"\n"), "paths.releases_dir")
        .unwrap();
    assert_invalid(config_from_toml("[paths]\nprojects_dir = \"../p\"\n"), "paths.projects_dir")
        .unwrap();
    assert_invalid(config_from_toml("[paths]\nprojects_dir = \"  \"\n"), "path is empty").unwrap();
    let component = "a".repeat(256);
    assert_invalid(
        config_from_toml(&format!("[paths]\nreleases_dir = \"{component}\"\n")),
        "length limits",
    )
    .unwrap();
}

#[test]
fn file_sink_requires_a_path() {
    assert_invalid(config_from_toml("[audit]\nsink = \"file\"\n"), "audit.path must be set").unwrap();
    assert_invalid(
        config_from_toml("[audit]\nsink = \"file\"\npath = \"../audit.jsonl\"\n"),
        "audit.path",
    )
    .unwrap();
}

#[test]
fn unknown_keys_and_values_are_parse_errors() {
    assert_invalid(config_from_toml("[paths]\nrelease_dir = \"r\"\n"), "config parse error").unwrap();
    assert_invalid(config_from_toml("[bundle]\nconflict_policy = \"newest\"\n"), "config parse error")
        .unwrap();
    assert_invalid(config_from_toml("[audit]\nsink = \"syslog\"\n"), "config parse error").unwrap();
}

#[test]
fn actor_must_be_short_and_non_empty() {
    assert_invalid(config_from_toml("[actor]\nname = \"\"\n"), "actor.name must be non-empty").unwrap();
    let long = "x".repeat(65);
    assert_invalid(config_from_toml(&format!("[actor]\nname = \"{long}\"\n")), "actor.name exceeds")
        .unwrap();
}

#[test]
fn file_sink_appends_json_lines_under_the_root() {
    let dir = tempfile::tempdir().unwrap();
    let config =
        config_from_toml("[audit]\nsink = \"file\"\npath = \"logs/audit.jsonl\"\n").unwrap();
    let sink = config.audit.open_sink(dir.path()).unwrap();
    sink.record(&AuditEvent::ShotCreated {
        at: UtcTimestamp::parse("2026-03-01T09:00:00Z").unwrap(),
        shot_id: ShotId::new("SH001"),
        actor: "cli".to_string(),
    });
    drop(sink);
    let log = std::fs::read_to_string(dir.path().join("logs/audit.jsonl")).unwrap();
    assert_eq!(log.lines().count(), 1);
    assert!(log.contains("shot_created"));
}

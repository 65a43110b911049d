// crates/reelgate-core/src/core/policy.rs
// ============================================================================
// Module: Reelgate Project Policy
// Description: Project configuration file, release policy, and QC policy.
// Purpose: Model the `project.json` contract enforced by the release gate.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! `project.json` carries the release policy. All four policy fields are
//! mandatory; a missing field fails the gate exactly like a wrong value. The
//! optional `qc` section names the phases whose QC report must also carry a
//! passing passive-check sentinel.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::error::PipelineError;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::identifiers::ProjectId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// File name of the project policy file.
pub const PROJECT_FILE_NAME: &str = "project.json";
/// The only accepted `path_mode`.
pub const REQUIRED_PATH_MODE: &str = "relative";
/// Default metrics field carrying the passive-check status.
pub const DEFAULT_PASSIVE_CHECK_FIELD: &str = "passive_check_status";
/// Default passing sentinel for the passive check.
pub const DEFAULT_PASSIVE_CHECK_PASS: &str = "PASS";

// ============================================================================
// SECTION: Release Policy
// ============================================================================

/// Release policy fields as read from disk.
///
/// # Invariants
/// - Fields stay optional on read so absence is reported as a violation
///   instead of a parse error.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectPolicy {
    /// Digest algorithm label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_alg: Option<String>,
    /// Path mode label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_mode: Option<String>,
    /// Whether DONE outputs are immutable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub immutable_outputs: Option<bool>,
    /// Whether releasing requires a verified manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_requires_manifest: Option<bool>,
}

impl ProjectPolicy {
    /// Returns a policy holding every required value.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            hash_alg: Some(DEFAULT_HASH_ALGORITHM.as_str().to_string()),
            path_mode: Some(REQUIRED_PATH_MODE.to_string()),
            immutable_outputs: Some(true),
            done_requires_manifest: Some(true),
        }
    }

    /// Lists every field that does not hold its required value.
    #[must_use]
    pub fn violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        let hash_alg = DEFAULT_HASH_ALGORITHM.as_str();
        match self.hash_alg.as_deref() {
            Some(value) if value == hash_alg => {}
            Some(value) => violations.push(format!("policy.hash_alg must be {hash_alg}, got {value}")),
            None => violations.push("policy.hash_alg is missing".to_string()),
        }
        match self.path_mode.as_deref() {
            Some(REQUIRED_PATH_MODE) => {}
            Some(value) => violations
                .push(format!("policy.path_mode must be {REQUIRED_PATH_MODE}, got {value}")),
            None => violations.push("policy.path_mode is missing".to_string()),
        }
        match self.immutable_outputs {
            Some(true) => {}
            Some(false) => violations.push("policy.immutable_outputs must be true".to_string()),
            None => violations.push("policy.immutable_outputs is missing".to_string()),
        }
        match self.done_requires_manifest {
            Some(true) => {}
            Some(false) => {
                violations.push("policy.done_requires_manifest must be true".to_string());
            }
            None => violations.push("policy.done_requires_manifest is missing".to_string()),
        }
        violations
    }

    /// Fails unless every field holds its required value.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::PolicyViolation`] listing every failing field.
    pub fn enforce(&self) -> Result<(), PipelineError> {
        let violations = self.violations();
        if violations.is_empty() {
            return Ok(());
        }
        Err(PipelineError::PolicyViolation(violations.join("; ")))
    }
}

// ============================================================================
// SECTION: QC Policy
// ============================================================================

/// Phases that require the passive-check sentinel in their QC report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QcPolicy {
    /// Phase labels requiring the passive check.
    #[serde(default)]
    pub passive_check_phases: Vec<String>,
    /// Metrics field carrying the status.
    #[serde(default = "default_passive_check_field")]
    pub passive_check_field: String,
    /// Passing sentinel value.
    #[serde(default = "default_passive_check_pass")]
    pub passive_check_pass: String,
}

impl Default for QcPolicy {
    fn default() -> Self {
        Self {
            passive_check_phases: Vec::new(),
            passive_check_field: default_passive_check_field(),
            passive_check_pass: default_passive_check_pass(),
        }
    }
}

impl QcPolicy {
    /// Returns true when shots in `phase` need the passive-check sentinel.
    #[must_use]
    pub fn requires_passive_check(&self, phase: &str) -> bool {
        self.passive_check_phases.iter().any(|candidate| candidate == phase)
    }
}

/// Default metrics field name.
fn default_passive_check_field() -> String {
    DEFAULT_PASSIVE_CHECK_FIELD.to_string()
}

/// Default passing sentinel.
fn default_passive_check_pass() -> String {
    DEFAULT_PASSIVE_CHECK_PASS.to_string()
}

// ============================================================================
// SECTION: Project File
// ============================================================================

/// Parsed `project.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    /// Project identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProjectId>,
    /// Release policy.
    #[serde(default)]
    pub policy: ProjectPolicy,
    /// QC policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qc: Option<QcPolicy>,
    /// Remaining keys.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ProjectFile {
    /// Parses project file bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Invalid`] when the bytes are not a valid
    /// project file.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, PipelineError> {
        serde_json::from_slice(bytes)
            .map_err(|err| PipelineError::Invalid(format!("project.json: {err}")))
    }

    /// Returns the QC policy, defaulting to no passive-check phases.
    #[must_use]
    pub fn qc_policy(&self) -> QcPolicy {
        self.qc.clone().unwrap_or_default()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use super::*;

    #[test]
    fn strict_policy_passes() {
        assert!(ProjectPolicy::strict().enforce().is_ok());
    }

    #[test]
    fn missing_fields_are_violations() {
        let project = ProjectFile::from_json_bytes(br#"{"policy": {"hash_alg": "sha256"}}"#).unwrap();
        let violations = project.policy.violations();
        assert_eq!(violations.len(), 3);
        assert!(matches!(project.policy.enforce(), Err(PipelineError::PolicyViolation(_))));
    }

    #[test]
    fn wrong_values_are_violations() {
        let policy = ProjectPolicy {
            hash_alg: Some("md5".to_string()),
            path_mode: Some("absolute".to_string()),
            immutable_outputs: Some(false),
            done_requires_manifest: Some(true),
        };
        let violations = policy.violations();
        assert_eq!(violations.len(), 3);
        assert!(violations[0].contains("md5"));
    }

    #[test]
    fn qc_section_defaults_field_names() {
        let project = ProjectFile::from_json_bytes(
            br#"{"policy": {}, "qc": {"passive_check_phases": ["FAZ_2"]}}"#,
        )
        .unwrap();
        let qc = project.qc_policy();
        assert!(qc.requires_passive_check("FAZ_2"));
        assert!(!qc.requires_passive_check("FAZ_1"));
        assert_eq!(qc.passive_check_field, DEFAULT_PASSIVE_CHECK_FIELD);
        assert_eq!(qc.passive_check_pass, DEFAULT_PASSIVE_CHECK_PASS);
    }
}

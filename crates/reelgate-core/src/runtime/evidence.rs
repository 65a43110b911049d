// crates/reelgate-core/src/runtime/evidence.rs
// ============================================================================
// Module: Reelgate QC Evidence
// Description: QC report checks shared by transition guards and the gate.
// Purpose: Decide whether a shot's QC evidence is acceptable, failing closed.
// Dependencies: crate::{core, interfaces}, serde_json
// ============================================================================

//! ## Overview
//! A QC report passes when it is a JSON object accepted by the configured
//! schema validator, `ok` is `true`, `errors` is an empty list and, for
//! phases listed in the [`QcPolicy`], the configured metrics field equals the
//! passing sentinel. The same check runs at `QC -> DONE` and again against
//! the released copy at gate time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use serde_json::Value;

use crate::core::paths::ensure_safe_relative;
use crate::core::paths::resolve_within;
use crate::core::policy::QcPolicy;
use crate::core::shot::PREVIEW_OUTPUT_KEY;
use crate::core::shot::QC_OUTPUT_KEY;
use crate::core::shot::Shot;
use crate::interfaces::QcReportValidator;
use crate::runtime::files::MAX_QC_REPORT_BYTES;
use crate::runtime::files::read_bytes_with_limit;

// ============================================================================
// SECTION: Structural Validator
// ============================================================================

/// Minimal validator requiring `ok: bool` and `errors: [string]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralQcValidator;

impl QcReportValidator for StructuralQcValidator {
    fn validate(&self, report: &Value) -> Result<(), String> {
        let Some(object) = report.as_object() else {
            return Err("report must be a JSON object".to_string());
        };
        if !object.get("ok").is_some_and(Value::is_boolean) {
            return Err("ok must be a boolean".to_string());
        }
        match object.get("errors") {
            Some(Value::Array(items)) if items.iter().all(Value::is_string) => {}
            _ => return Err("errors must be a list of strings".to_string()),
        }
        match object.get("metrics") {
            None | Some(Value::Object(_)) => Ok(()),
            Some(_) => Err("metrics must be an object".to_string()),
        }
    }
}

// ============================================================================
// SECTION: Checks
// ============================================================================

/// Checks a parsed QC report.
///
/// # Errors
///
/// Returns the rejection reason.
pub fn check_qc_report<V: QcReportValidator + ?Sized>(
    report: &Value,
    phase: &str,
    policy: &QcPolicy,
    validator: &V,
) -> Result<(), String> {
    if !report.is_object() {
        return Err("qc.json must be a JSON object".to_string());
    }
    validator
        .validate(report)
        .map_err(|reason| format!("qc.json failed schema validation: {reason}"))?;
    if report.get("ok") != Some(&Value::Bool(true)) {
        return Err("requires qc.json ok:true".to_string());
    }
    match report.get("errors") {
        Some(Value::Array(errors)) if errors.is_empty() => {}
        _ => return Err("requires qc.json errors:[]".to_string()),
    }
    if policy.requires_passive_check(phase) {
        let field = policy.passive_check_field.as_str();
        let status = report.get("metrics").and_then(|metrics| metrics.get(field));
        if status.and_then(Value::as_str) != Some(policy.passive_check_pass.as_str()) {
            return Err(format!(
                "requires qc.json metrics.{field} == {} for phase {phase}",
                policy.passive_check_pass
            ));
        }
    }
    Ok(())
}

/// Reads and checks a QC report file.
///
/// # Errors
///
/// Returns the rejection reason, including unreadable or malformed files.
pub fn check_qc_report_file<V: QcReportValidator + ?Sized>(
    path: &Path,
    phase: &str,
    policy: &QcPolicy,
    validator: &V,
) -> Result<(), String> {
    let bytes = read_bytes_with_limit(path, MAX_QC_REPORT_BYTES)
        .map_err(|err| format!("qc.json unreadable: {err}"))?;
    let report: Value =
        serde_json::from_slice(&bytes).map_err(|err| format!("qc.json is not valid JSON: {err}"))?;
    check_qc_report(&report, phase, policy, validator)
}

/// Checks the evidence a shot needs before it may become DONE.
///
/// Both `qc.json` and `preview.mp4` must be recorded as safe relative paths
/// that exist on disk under `base_dir`, and the QC report must pass
/// [`check_qc_report`].
///
/// # Errors
///
/// Returns the first rejection reason.
pub fn check_done_evidence<V: QcReportValidator + ?Sized>(
    shot: &Shot,
    base_dir: &Path,
    policy: &QcPolicy,
    validator: &V,
) -> Result<(), String> {
    let mut qc_path = None;
    for key in [QC_OUTPUT_KEY, PREVIEW_OUTPUT_KEY] {
        let Some(relative) = shot.output(key) else {
            return Err(format!("requires outputs['{key}']"));
        };
        ensure_safe_relative(relative)
            .map_err(|err| format!("outputs['{key}'] is not a safe relative path: {err}"))?;
        let resolved = resolve_within(base_dir, relative)
            .map_err(|err| format!("outputs['{key}'] is not a safe relative path: {err}"))?;
        if !resolved.is_file() {
            return Err(format!("requires outputs['{key}'] file to exist on disk: {relative}"));
        }
        if key == QC_OUTPUT_KEY {
            qc_path = Some(resolved);
        }
    }
    let Some(qc_path) = qc_path else {
        return Err(format!("requires outputs['{QC_OUTPUT_KEY}']"));
    };
    check_qc_report_file(&qc_path, &shot.phase, policy, validator)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use serde_json::json;

    use super::*;

    fn passive_policy() -> QcPolicy {
        QcPolicy {
            passive_check_phases: vec!["FAZ_2".to_string()],
            ..QcPolicy::default()
        }
    }

    #[test]
    fn passing_report_is_accepted() {
        let report = json!({"ok": true, "errors": []});
        assert!(check_qc_report(&report, "FAZ_1", &passive_policy(), &StructuralQcValidator).is_ok());
    }

    #[test]
    fn failing_flags_are_rejected() {
        let policy = QcPolicy::default();
        let not_ok = json!({"ok": false, "errors": []});
        assert_eq!(
            check_qc_report(&not_ok, "FAZ_1", &policy, &StructuralQcValidator).unwrap_err(),
            "requires qc.json ok:true"
        );
        let with_errors = json!({"ok": true, "errors": ["clipped audio"]});
        assert_eq!(
            check_qc_report(&with_errors, "FAZ_1", &policy, &StructuralQcValidator).unwrap_err(),
            "requires qc.json errors:[]"
        );
    }

    #[test]
    fn schema_violation_is_rejected() {
        let report = json!({"ok": "yes", "errors": []});
        let reason =
            check_qc_report(&report, "FAZ_1", &QcPolicy::default(), &StructuralQcValidator)
                .unwrap_err();
        assert!(reason.contains("schema"));
    }

    #[test]
    fn passive_phase_requires_sentinel() {
        let policy = passive_policy();
        let missing = json!({"ok": true, "errors": []});
        assert!(check_qc_report(&missing, "FAZ_2", &policy, &StructuralQcValidator).is_err());
        let failing =
            json!({"ok": true, "errors": [], "metrics": {"passive_check_status": "FAIL"}});
        assert!(check_qc_report(&failing, "FAZ_2", &policy, &StructuralQcValidator).is_err());
        let passing =
            json!({"ok": true, "errors": [], "metrics": {"passive_check_status": "PASS"}});
        assert!(check_qc_report(&passing, "FAZ_2", &policy, &StructuralQcValidator).is_ok());
    }
}

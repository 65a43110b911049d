// crates/reelgate-contract/src/validation.rs
// ============================================================================
// Module: Contract Validation
// Description: Compiled JSON schema validators for QC reports and shots.
// Purpose: Back the core validator seam with real schema validation.
// Dependencies: jsonschema, reelgate-core, serde_json
// ============================================================================

//! ## Overview
//! Schemas are compiled once per validator. Validation reports every schema
//! error rather than stopping at the first, prefixed with the location that
//! failed, so a `validate` run lists all problems in a state document.

// ============================================================================
// SECTION: Imports
// ============================================================================

use jsonschema::Draft;
use jsonschema::Validator;
use reelgate_core::QcReportValidator;
use reelgate_core::runtime::shots::validate_state_value;
use serde_json::Value;

use crate::ContractError;
use crate::schemas::qc_report_schema;
use crate::schemas::shot_schema;

// ============================================================================
// SECTION: Compilation
// ============================================================================

/// Compiles a Draft 7 schema.
fn compile_schema(name: &'static str, schema: &Value) -> Result<Validator, ContractError> {
    jsonschema::options().with_draft(Draft::Draft7).build(schema).map_err(|err| {
        ContractError::Schema {
            name,
            error: err.to_string(),
        }
    })
}

/// Collects every schema error for `instance`.
fn collect_errors(validator: &Validator, instance: &Value) -> Vec<String> {
    validator.iter_errors(instance).map(|err| err.to_string()).collect()
}

// ============================================================================
// SECTION: QC Reports
// ============================================================================

/// QC report validator backed by the canonical QC schema.
pub struct SchemaQcValidator {
    /// Compiled QC report schema.
    validator: Validator,
}

impl SchemaQcValidator {
    /// Compiles the QC report schema.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::Schema`] when the schema does not compile.
    pub fn new() -> Result<Self, ContractError> {
        Ok(Self {
            validator: compile_schema("qc", &qc_report_schema())?,
        })
    }
}

impl QcReportValidator for SchemaQcValidator {
    fn validate(&self, report: &Value) -> Result<(), String> {
        let errors = collect_errors(&self.validator, report);
        if errors.is_empty() { Ok(()) } else { Err(errors.join("; ")) }
    }
}

// ============================================================================
// SECTION: State Documents
// ============================================================================

/// Validator for whole state documents.
pub struct StateDocumentValidator {
    /// Compiled shot schema.
    shot: Validator,
}

impl StateDocumentValidator {
    /// Compiles the shot schema.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::Schema`] when the schema does not compile.
    pub fn new() -> Result<Self, ContractError> {
        Ok(Self {
            shot: compile_schema("shot", &shot_schema())?,
        })
    }

    /// Lists every structural and schema problem in a state document.
    ///
    /// An empty result means the document is valid.
    #[must_use]
    pub fn validate(&self, document: &Value) -> Vec<String> {
        let mut problems = validate_state_value(document);
        if let Some(shots) = document.get("shots").and_then(Value::as_object) {
            for (key, shot) in shots {
                if !shot.is_object() {
                    problems.push(format!("shots.{key}: shot value must be an object"));
                    continue;
                }
                problems.extend(
                    collect_errors(&self.shot, shot)
                        .into_iter()
                        .map(|error| format!("shots.{key}: {error}")),
                );
            }
        }
        problems
    }
}

/// Validates a state document with a freshly compiled validator.
///
/// # Errors
///
/// Returns [`ContractError::Schema`] when the shot schema does not compile.
pub fn validate_state_document(document: &Value) -> Result<Vec<String>, ContractError> {
    Ok(StateDocumentValidator::new()?.validate(document))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use serde_json::json;

    use super::*;

    #[test]
    fn qc_schema_accepts_minimal_report() {
        let validator = SchemaQcValidator::new().unwrap();
        assert!(validator.validate(&json!({"ok": false, "errors": ["blur"]})).is_ok());
    }

    #[test]
    fn qc_schema_rejects_wrong_types() {
        let validator = SchemaQcValidator::new().unwrap();
        assert!(validator.validate(&json!({"ok": "true", "errors": []})).is_err());
        assert!(validator.validate(&json!({"ok": true, "errors": [1]})).is_err());
        assert!(validator.validate(&json!({"ok": true})).is_err());
    }
}

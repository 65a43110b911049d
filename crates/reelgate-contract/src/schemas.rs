// crates/reelgate-contract/src/schemas.rs
// ============================================================================
// Module: Contract Schemas
// Description: JSON schema builders for the shot record and QC report.
// Purpose: Provide canonical validation schemas for externally edited files.
// Dependencies: reelgate-core, serde_json
// ============================================================================

//! ## Overview
//! The schemas mirror the persisted shapes in `reelgate_core::core::shot` and
//! the QC report consumed by the `QC -> DONE` guard. Both target JSON Schema
//! Draft 7. Unknown properties are allowed because the state document
//! preserves keys it does not understand.

// ============================================================================
// SECTION: Imports
// ============================================================================

use reelgate_core::ShotStatus;
use reelgate_core::core::shot::HistoryEventKind;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Draft identifier shared by every schema.
pub const SCHEMA_DRAFT: &str = "http://json-schema.org/draft-07/schema#";

// ============================================================================
// SECTION: Public Schema Entrypoints
// ============================================================================

/// Returns the JSON schema for one shot record.
#[must_use]
pub fn shot_schema() -> Value {
    json!({
        "$schema": SCHEMA_DRAFT,
        "$id": "reelgate://contract/schemas/shot.schema.json",
        "title": "Reelgate Shot",
        "description": "One shot tracked by the state document.",
        "type": "object",
        "required": ["id", "phase", "status"],
        "properties": {
            "id": identifier_schema("Shot identifier; equals its key in the document."),
            "phase": {
                "type": "string",
                "minLength": 1,
                "description": "Production phase label."
            },
            "status": {
                "type": "string",
                "enum": status_labels(),
                "description": "Current lifecycle status."
            },
            "inputs": {
                "type": "object",
                "properties": {
                    "prompt": { "type": "string" }
                }
            },
            "outputs": {
                "type": "object",
                "additionalProperties": { "type": "string" },
                "description": "Output key to path relative to the state document."
            },
            "history": {
                "type": "array",
                "items": history_entry_schema()
            },
            "release": identifier_schema("Release the shot was promoted into.")
        }
    })
}

/// Returns the JSON schema for a QC report.
#[must_use]
pub fn qc_report_schema() -> Value {
    json!({
        "$schema": SCHEMA_DRAFT,
        "$id": "reelgate://contract/schemas/qc.schema.json",
        "title": "Reelgate QC Report",
        "description": "Quality-control verdict for one shot.",
        "type": "object",
        "required": ["ok", "errors"],
        "properties": {
            "ok": { "type": "boolean" },
            "errors": {
                "type": "array",
                "items": { "type": "string" }
            },
            "warnings": {
                "type": "array",
                "items": { "type": "string" }
            },
            "metrics": { "type": "object" }
        }
    })
}

// ============================================================================
// SECTION: Fragments
// ============================================================================

/// Schema for one history entry.
fn history_entry_schema() -> Value {
    json!({
        "type": "object",
        "required": ["event", "at", "by"],
        "properties": {
            "event": {
                "type": "string",
                "enum": history_labels()
            },
            "from": { "type": "string", "enum": status_labels() },
            "to": { "type": "string", "enum": status_labels() },
            "at": timestamp_schema(),
            "by": { "type": "string", "minLength": 1 },
            "note": { "type": "string" }
        }
    })
}

/// Schema for a canonical UTC timestamp.
fn timestamp_schema() -> Value {
    json!({
        "type": "string",
        "pattern": "^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}Z$"
    })
}

/// Schema for a path-safe identifier.
fn identifier_schema(description: &str) -> Value {
    json!({
        "type": "string",
        "minLength": 1,
        "maxLength": 255,
        "pattern": "^[^/\\\\]+$",
        "description": description
    })
}

/// Status labels in lifecycle order.
fn status_labels() -> Vec<&'static str> {
    ShotStatus::ALL.iter().map(|status| status.as_str()).collect()
}

/// History event labels.
fn history_labels() -> Vec<&'static str> {
    HistoryEventKind::ALL.iter().map(|kind| kind.as_str()).collect()
}

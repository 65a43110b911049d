// crates/reelgate-contract/src/lib.rs
// ============================================================================
// Module: Reelgate Contract Library
// Description: Canonical schemas and schema-backed validators.
// Purpose: Validate hand-edited state documents and QC reports.
// Dependencies: jsonschema, reelgate-core, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The contract library owns the JSON schemas for the shot record and the QC
//! report, and implements [`reelgate_core::QcReportValidator`] on top of them.
//! Schemas are built in code so they always match the core model.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod schemas;
pub mod validation;

// ============================================================================
// SECTION: Errors
// ============================================================================

use thiserror::Error;

/// Errors raised while preparing contract validators.
#[derive(Debug, Error)]
pub enum ContractError {
    /// A built-in schema failed to compile.
    #[error("schema {name} failed to compile: {error}")]
    Schema {
        /// Schema name.
        name: &'static str,
        /// Compiler message.
        error: String,
    },
}

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use schemas::qc_report_schema;
pub use schemas::shot_schema;
pub use validation::SchemaQcValidator;
pub use validation::StateDocumentValidator;
pub use validation::validate_state_document;

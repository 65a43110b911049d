// crates/reelgate-cli/src/lib.rs
// ============================================================================
// Module: Reelgate CLI Library
// Description: Shared helpers for the reelgate command-line interface.
// Purpose: Provide reusable components (messages, exit codes) for the binary and tests.
// Dependencies: reelgate-core
// ============================================================================

//! ## Overview
//! This library houses the CLI message catalog and the stable exit code
//! table. The binary entry point (`src/main.rs`) imports these helpers so all
//! user-facing output and process status stay consistent.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Stable process exit codes.
pub mod exit_codes;
/// Message catalog and formatting helpers.
pub mod i18n;

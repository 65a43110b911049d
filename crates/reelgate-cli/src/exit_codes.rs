// crates/reelgate-cli/src/exit_codes.rs
// ============================================================================
// Module: CLI Exit Codes
// Description: Maps pipeline error kinds to stable process exit codes.
// Purpose: Let scripts branch on failure class without parsing messages.
// Dependencies: reelgate-core
// ============================================================================

//! ## Overview
//! Exit codes group error kinds into five classes. The mapping is part of
//! the CLI contract and must not change between releases.

use reelgate_core::ErrorKind;

/// Command succeeded.
pub const SUCCESS: u8 = 0;
/// I/O or internal failure.
pub const IO_FAILURE: u8 = 1;
/// Input or transition validation failure.
pub const VALIDATION_FAILURE: u8 = 2;
/// Gate, integrity, or format failure.
pub const GATE_FAILURE: u8 = 3;
/// Referenced entity is missing.
pub const NOT_FOUND: u8 = 4;
/// Destination or shot ownership conflict.
pub const CONFLICT: u8 = 5;

/// Returns the exit code for an error kind.
#[must_use]
pub const fn exit_code_for(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Io => IO_FAILURE,
        ErrorKind::Invalid | ErrorKind::InvalidTransition | ErrorKind::GuardFailed => {
            VALIDATION_FAILURE
        }
        ErrorKind::PolicyViolation
        | ErrorKind::IntegrityMismatch
        | ErrorKind::UnsupportedFormat
        | ErrorKind::UnsafePath => GATE_FAILURE,
        ErrorKind::NotFound => NOT_FOUND,
        ErrorKind::Conflict | ErrorKind::AlreadyExists => CONFLICT,
    }
}

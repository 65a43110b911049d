// crates/reelgate-core/src/core/error.rs
// ============================================================================
// Module: Reelgate Error Taxonomy
// Description: Stable error kinds shared by every pipeline operation.
// Purpose: Give automated callers a distinct, machine-readable failure class.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Every pipeline operation fails with a [`PipelineError`]. Errors are terminal
//! for the current invocation and are never retried internally. Each variant
//! maps onto a stable [`ErrorKind`] label that the CLI turns into an exit code.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::hashing::HashError;
use crate::core::identifiers::ShotId;
use crate::core::paths::PathError;
use crate::core::shot::ShotStatus;

// ============================================================================
// SECTION: Error Kind
// ============================================================================

/// Stable machine-readable error class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A shot, file, manifest, or policy is missing.
    NotFound,
    /// Illegal status change or terminal source status.
    InvalidTransition,
    /// Transition evidence is missing or invalid.
    GuardFailed,
    /// Hash or size disagreement.
    IntegrityMismatch,
    /// Absolute or escaping path.
    UnsafePath,
    /// Unknown manifest version or hash algorithm.
    UnsupportedFormat,
    /// Project policy field does not hold the required value.
    PolicyViolation,
    /// Duplicate shot across bundle sources under the `fail` policy.
    Conflict,
    /// Output destination already exists.
    AlreadyExists,
    /// Malformed input document or argument.
    Invalid,
    /// Filesystem failure.
    Io,
}

impl ErrorKind {
    /// Returns the stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::InvalidTransition => "invalid_transition",
            Self::GuardFailed => "guard_failed",
            Self::IntegrityMismatch => "integrity_mismatch",
            Self::UnsafePath => "unsafe_path",
            Self::UnsupportedFormat => "unsupported_format",
            Self::PolicyViolation => "policy_violation",
            Self::Conflict => "conflict",
            Self::AlreadyExists => "already_exists",
            Self::Invalid => "invalid",
            Self::Io => "io",
        }
    }
}

// ============================================================================
// SECTION: Pipeline Error
// ============================================================================

/// Failure of a pipeline operation.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A shot, file, manifest, or policy is missing.
    #[error("not found: {0}")]
    NotFound(String),
    /// The requested status is not reachable from the current one.
    #[error("invalid transition for {shot}: {from} -> {to}")]
    InvalidTransition {
        /// Shot identifier.
        shot: ShotId,
        /// Current status.
        from: ShotStatus,
        /// Requested status.
        to: ShotStatus,
    },
    /// The current status is terminal.
    #[error("invalid transition for {shot}: {status} is terminal")]
    TerminalStatus {
        /// Shot identifier.
        shot: ShotId,
        /// Terminal status.
        status: ShotStatus,
    },
    /// A transition guard rejected the request.
    #[error("guard failed for {shot} ({from} -> {to}): {reason}")]
    GuardFailed {
        /// Shot identifier.
        shot: ShotId,
        /// Current status.
        from: ShotStatus,
        /// Requested status.
        to: ShotStatus,
        /// Human-readable reason.
        reason: String,
    },
    /// Hash or size disagreement.
    #[error("integrity mismatch: {}", details.join("; "))]
    IntegrityMismatch {
        /// One line per mismatched artifact.
        details: Vec<String>,
    },
    /// Absolute or escaping path.
    #[error("unsafe path: {0}")]
    UnsafePath(String),
    /// Unknown manifest version or hash algorithm.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    /// Project policy field does not hold the required value.
    #[error("policy violation: {0}")]
    PolicyViolation(String),
    /// Duplicate shot across bundle sources.
    #[error("conflict: shot {shot} is claimed by {first} and {second}")]
    Conflict {
        /// Shot identifier.
        shot: ShotId,
        /// First source claiming the shot.
        first: String,
        /// Second source claiming the shot.
        second: String,
    },
    /// Output destination already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),
    /// Malformed input document or argument.
    #[error("invalid input: {0}")]
    Invalid(String),
    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(String),
}

impl PipelineError {
    /// Returns the stable error class.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidTransition { .. } | Self::TerminalStatus { .. } => {
                ErrorKind::InvalidTransition
            }
            Self::GuardFailed { .. } => ErrorKind::GuardFailed,
            Self::IntegrityMismatch { .. } => ErrorKind::IntegrityMismatch,
            Self::UnsafePath(_) => ErrorKind::UnsafePath,
            Self::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Self::PolicyViolation(_) => ErrorKind::PolicyViolation,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::Invalid(_) => ErrorKind::Invalid,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

impl PipelineError {
    /// Appends `note` to the error detail while keeping its kind.
    ///
    /// Status transition errors carry no free-form detail and are returned
    /// unchanged.
    #[must_use]
    pub fn with_detail(self, note: &str) -> Self {
        match self {
            Self::NotFound(detail) => Self::NotFound(format!("{detail}; {note}")),
            Self::UnsafePath(detail) => Self::UnsafePath(format!("{detail}; {note}")),
            Self::UnsupportedFormat(detail) => Self::UnsupportedFormat(format!("{detail}; {note}")),
            Self::PolicyViolation(detail) => Self::PolicyViolation(format!("{detail}; {note}")),
            Self::AlreadyExists(detail) => Self::AlreadyExists(format!("{detail}; {note}")),
            Self::Invalid(detail) => Self::Invalid(format!("{detail}; {note}")),
            Self::Io(detail) => Self::Io(format!("{detail}; {note}")),
            Self::IntegrityMismatch {
                mut details,
            } => {
                details.push(note.to_string());
                Self::IntegrityMismatch {
                    details,
                }
            }
            Self::GuardFailed {
                shot,
                from,
                to,
                reason,
            } => Self::GuardFailed {
                shot,
                from,
                to,
                reason: format!("{reason}; {note}"),
            },
            Self::Conflict {
                shot,
                first,
                second,
            } => Self::Conflict {
                shot,
                first,
                second: format!("{second} ({note})"),
            },
            other @ (Self::InvalidTransition { .. } | Self::TerminalStatus { .. }) => other,
        }
    }
}

impl From<PathError> for PipelineError {
    fn from(err: PathError) -> Self {
        Self::UnsafePath(err.to_string())
    }
}

impl From<HashError> for PipelineError {
    fn from(err: HashError) -> Self {
        match err {
            HashError::NotFound(path) => Self::NotFound(path),
            HashError::Io {
                ..
            }
            | HashError::Canonicalization(_) => Self::Io(err.to_string()),
        }
    }
}

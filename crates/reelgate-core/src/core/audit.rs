// crates/reelgate-core/src/core/audit.rs
// ============================================================================
// Module: Reelgate Audit Events
// Description: Structured audit payloads emitted by pipeline operations.
// Purpose: Record every state change and gate decision as one JSON line.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Audit events serialize with an `event` tag and carry the caller-supplied
//! timestamp. Sinks are defined in [`crate::runtime::audit`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::core::error::ErrorKind;
use crate::core::identifiers::ProjectId;
use crate::core::identifiers::ReleaseId;
use crate::core::identifiers::ShotId;
use crate::core::manifest::ConflictPolicy;
use crate::core::manifest::ManifestTotals;
use crate::core::shot::ShotStatus;
use crate::core::time::UtcTimestamp;

// ============================================================================
// SECTION: Events
// ============================================================================

/// Audit event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    /// A shot was added to the state document.
    ShotCreated {
        /// Event time.
        at: UtcTimestamp,
        /// Shot identifier.
        shot_id: ShotId,
        /// Acting user.
        actor: String,
    },
    /// An output path was recorded on a shot.
    OutputAttached {
        /// Event time.
        at: UtcTimestamp,
        /// Shot identifier.
        shot_id: ShotId,
        /// Output key.
        key: String,
        /// Relative output path.
        path: String,
        /// Acting user.
        actor: String,
    },
    /// A transition was applied.
    StatusChanged {
        /// Event time.
        at: UtcTimestamp,
        /// Shot identifier.
        shot_id: ShotId,
        /// Previous status.
        from: ShotStatus,
        /// New status.
        to: ShotStatus,
        /// Acting user.
        actor: String,
    },
    /// A transition was rejected.
    TransitionRejected {
        /// Event time.
        at: UtcTimestamp,
        /// Shot identifier.
        shot_id: ShotId,
        /// Requested status.
        to: ShotStatus,
        /// Error class.
        error_kind: ErrorKind,
        /// Rejection message.
        reason: String,
    },
    /// The release gate was evaluated.
    GateEvaluated {
        /// Event time.
        at: UtcTimestamp,
        /// Project identifier.
        project_id: ProjectId,
        /// Release identifier.
        release_id: ReleaseId,
        /// Whether the gate passed.
        passed: bool,
        /// Failure message.
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    /// A release directory and manifest were written.
    ReleaseBuilt {
        /// Event time.
        at: UtcTimestamp,
        /// Release identifier.
        release_id: ReleaseId,
        /// Release totals.
        totals: ManifestTotals,
    },
    /// A flat artifact manifest was written.
    ManifestBuilt {
        /// Event time.
        at: UtcTimestamp,
        /// Release identifier.
        release_id: ReleaseId,
        /// Manifest totals.
        totals: ManifestTotals,
    },
    /// A bundle conflict was resolved under the `latest` policy.
    BundleConflictResolved {
        /// Event time.
        at: UtcTimestamp,
        /// Contested shot.
        shot_id: ShotId,
        /// Source that keeps the shot.
        kept: ReleaseId,
        /// Source that loses the shot.
        dropped: ReleaseId,
        /// Policy applied.
        policy: ConflictPolicy,
    },
    /// A bundle directory and manifest were written.
    BundleBuilt {
        /// Event time.
        at: UtcTimestamp,
        /// Bundle identifier.
        bundle_id: ReleaseId,
        /// Number of source releases.
        sources: u64,
        /// Bundle totals.
        totals: ManifestTotals,
    },
}

impl AuditEvent {
    /// Returns the event tag.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ShotCreated { .. } => "shot_created",
            Self::OutputAttached { .. } => "output_attached",
            Self::StatusChanged { .. } => "status_changed",
            Self::TransitionRejected { .. } => "transition_rejected",
            Self::GateEvaluated { .. } => "gate_evaluated",
            Self::ReleaseBuilt { .. } => "release_built",
            Self::ManifestBuilt { .. } => "manifest_built",
            Self::BundleConflictResolved { .. } => "bundle_conflict_resolved",
            Self::BundleBuilt { .. } => "bundle_built",
        }
    }
}

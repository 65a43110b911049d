// crates/reelgate-core/src/runtime/transition.rs
// ============================================================================
// Module: Reelgate Shot State Machine
// Description: Guarded status transitions and batch promotion into releases.
// Purpose: Apply lifecycle changes with fail-closed guards and atomic saves.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! A transition is evaluated completely against one document snapshot before
//! anything is mutated: unknown shot, terminal status, illegal target, and the
//! per-edge guards are all checked first. A rejected request leaves the
//! document untouched and appends no history. An accepted request sets the
//! status, appends one `STATUS_CHANGED` entry, refreshes
//! `last_updated_utc`, and persists the whole document.
//!
//! Guards:
//! - `IN_PROGRESS -> QC` requires at least one output.
//! - `QC -> DONE` requires `qc.json` and `preview.mp4` on disk and a passing
//!   QC report.
//! - `DONE -> RELEASE` requires a release id and a passing release gate.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use crate::core::audit::AuditEvent;
use crate::core::error::PipelineError;
use crate::core::identifiers::ProjectId;
use crate::core::identifiers::ReleaseId;
use crate::core::identifiers::ShotId;
use crate::core::paths::ensure_single_segment;
use crate::core::policy::QcPolicy;
use crate::core::shot::HistoryEntry;
use crate::core::shot::ShotStatus;
use crate::core::shot::StateDocument;
use crate::core::time::UtcTimestamp;
use crate::interfaces::AuditSink;
use crate::interfaces::QcReportValidator;
use crate::interfaces::ReleaseGate;
use crate::interfaces::StateDocumentStore;
use crate::runtime::evidence::check_done_evidence;

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Fully-typed transition request built at the caller boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    /// Shot to transition.
    pub shot_id: ShotId,
    /// Requested status.
    pub to: ShotStatus,
    /// Acting user recorded in history.
    pub actor: String,
    /// Event time.
    pub at: UtcTimestamp,
    /// Target release for `DONE -> RELEASE`.
    pub release_id: Option<ReleaseId>,
    /// Project override for the release gate.
    pub project_id: Option<ProjectId>,
    /// Optional history note.
    pub note: Option<String>,
}

/// Result of an applied transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    /// Shot that changed.
    pub shot_id: ShotId,
    /// Previous status.
    pub from: ShotStatus,
    /// New status.
    pub to: ShotStatus,
    /// Release the shot joined, for promotions.
    pub release_id: Option<ReleaseId>,
}

/// Which shots a promotion covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromoteSelection {
    /// Every shot currently DONE.
    AllDone,
    /// An explicit list of shots.
    Shots(Vec<ShotId>),
}

/// Batch promotion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoteRequest {
    /// Release to promote into.
    pub release_id: ReleaseId,
    /// Project override for the release gate.
    pub project_id: Option<ProjectId>,
    /// Shots to promote.
    pub selection: PromoteSelection,
    /// Acting user recorded in history.
    pub actor: String,
    /// Event time.
    pub at: UtcTimestamp,
    /// Optional history note.
    pub note: Option<String>,
}

/// Result of a promotion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PromoteOutcome {
    /// Shots moved from DONE to RELEASE.
    pub promoted: Vec<ShotId>,
    /// Selected shots that were already RELEASE.
    pub already_released: Vec<ShotId>,
}

// ============================================================================
// SECTION: State Machine
// ============================================================================

/// Guarded shot lifecycle engine.
pub struct ShotStateMachine<S, V, G, A> {
    /// State document store.
    store: S,
    /// QC report schema validator.
    validator: V,
    /// Release gate.
    gate: G,
    /// Audit sink.
    audit: A,
    /// Passive-check phases for the QC guard.
    qc_policy: QcPolicy,
}

impl<S, V, G, A> ShotStateMachine<S, V, G, A>
where
    S: StateDocumentStore,
    V: QcReportValidator,
    G: ReleaseGate,
    A: AuditSink,
{
    /// Creates a state machine.
    #[must_use]
    pub fn new(store: S, validator: V, gate: G, audit: A, qc_policy: QcPolicy) -> Self {
        Self {
            store,
            validator,
            gate,
            audit,
            qc_policy,
        }
    }

    /// Returns the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Loads the document, applies one transition, and saves it.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] when the request is rejected or persistence
    /// fails. Rejected requests never reach the store.
    pub fn transition(
        &self,
        request: &TransitionRequest,
    ) -> Result<TransitionOutcome, PipelineError> {
        let mut document = self.store.load()?;
        let outcome = self.apply(&mut document, request)?;
        self.store.save(&document)?;
        self.record_change(&outcome, &request.actor, request.at);
        Ok(outcome)
    }

    /// Applies one transition to an in-memory document.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] when the request is rejected; the document is
    /// left unchanged in that case.
    pub fn apply(
        &self,
        document: &mut StateDocument,
        request: &TransitionRequest,
    ) -> Result<TransitionOutcome, PipelineError> {
        let (from, release_id) = match self.evaluate(document, request) {
            Ok(accepted) => accepted,
            Err(err) => {
                self.audit.record(&AuditEvent::TransitionRejected {
                    at: request.at,
                    shot_id: request.shot_id.clone(),
                    to: request.to,
                    error_kind: err.kind(),
                    reason: err.to_string(),
                });
                return Err(err);
            }
        };
        let shot = document.shot_mut(&request.shot_id)?;
        shot.status = request.to;
        shot.history.push(HistoryEntry::status_changed(
            from,
            request.to,
            request.at,
            request.actor.clone(),
            request.note.clone(),
        ));
        if let Some(release_id) = &release_id {
            shot.release = Some(release_id.clone());
        }
        document.touch(request.at);
        Ok(TransitionOutcome {
            shot_id: request.shot_id.clone(),
            from,
            to: request.to,
            release_id,
        })
    }

    /// Promotes DONE shots into a release after one gate check.
    ///
    /// Shots already in RELEASE are reported and skipped. Any other status in
    /// the selection rejects the whole batch.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] when a shot is unknown or not DONE, the gate
    /// fails, or persistence fails. Nothing is saved on error.
    pub fn promote(&self, request: &PromoteRequest) -> Result<PromoteOutcome, PipelineError> {
        ensure_single_segment(request.release_id.as_str())?;
        let mut document = self.store.load()?;
        let selected: Vec<ShotId> = match &request.selection {
            PromoteSelection::AllDone => document
                .shots_with_status(ShotStatus::Done)
                .map(|shot| shot.id.clone())
                .collect(),
            PromoteSelection::Shots(ids) => {
                let mut seen = BTreeSet::new();
                ids.iter().filter(|id| seen.insert((*id).clone())).cloned().collect()
            }
        };
        let mut outcome = PromoteOutcome::default();
        for shot_id in &selected {
            let shot = document.shot(shot_id)?;
            match shot.status {
                ShotStatus::Done => outcome.promoted.push(shot_id.clone()),
                ShotStatus::Release => outcome.already_released.push(shot_id.clone()),
                other => {
                    return Err(PipelineError::InvalidTransition {
                        shot: shot_id.clone(),
                        from: other,
                        to: ShotStatus::Release,
                    });
                }
            }
        }
        if outcome.promoted.is_empty() {
            if outcome.already_released.is_empty() {
                return Err(PipelineError::Invalid("no DONE shots selected for promotion".to_string()));
            }
            return Ok(outcome);
        }
        let project_id = request
            .project_id
            .clone()
            .unwrap_or_else(|| ProjectId::new(document.active_project.clone()));
        self.gate.check(&project_id, &request.release_id, request.at)?;
        for shot_id in &outcome.promoted {
            let shot = document.shot_mut(shot_id)?;
            shot.status = ShotStatus::Release;
            shot.release = Some(request.release_id.clone());
            shot.history.push(HistoryEntry::status_changed(
                ShotStatus::Done,
                ShotStatus::Release,
                request.at,
                request.actor.clone(),
                request.note.clone(),
            ));
        }
        document.touch(request.at);
        self.store.save(&document)?;
        for shot_id in &outcome.promoted {
            self.record_change(
                &TransitionOutcome {
                    shot_id: shot_id.clone(),
                    from: ShotStatus::Done,
                    to: ShotStatus::Release,
                    release_id: Some(request.release_id.clone()),
                },
                &request.actor,
                request.at,
            );
        }
        Ok(outcome)
    }

    /// Evaluates a request without mutating, returning the current status and
    /// the release id for promotions.
    fn evaluate(
        &self,
        document: &StateDocument,
        request: &TransitionRequest,
    ) -> Result<(ShotStatus, Option<ReleaseId>), PipelineError> {
        let shot = document.shot(&request.shot_id)?;
        let from = shot.status;
        let to = request.to;
        if from.is_terminal() {
            return Err(PipelineError::TerminalStatus {
                shot: shot.id.clone(),
                status: from,
            });
        }
        if !from.can_transition_to(to) {
            return Err(PipelineError::InvalidTransition {
                shot: shot.id.clone(),
                from,
                to,
            });
        }
        let guard_failed = |reason: String| PipelineError::GuardFailed {
            shot: shot.id.clone(),
            from,
            to,
            reason,
        };
        match (from, to) {
            (ShotStatus::InProgress, ShotStatus::Qc) => {
                if shot.outputs.values().all(|path| path.trim().is_empty()) {
                    return Err(guard_failed("requires non-empty outputs".to_string()));
                }
                Ok((from, None))
            }
            (ShotStatus::Qc, ShotStatus::Done) => {
                check_done_evidence(shot, self.store.base_dir(), &self.qc_policy, &self.validator)
                    .map_err(guard_failed)?;
                Ok((from, None))
            }
            (ShotStatus::Done, ShotStatus::Release) => {
                let release_id = request
                    .release_id
                    .clone()
                    .or_else(|| shot.release.clone())
                    .or_else(|| document.active_release.clone())
                    .ok_or_else(|| {
                        guard_failed(
                            "requires a release id (explicit or active_release)".to_string(),
                        )
                    })?;
                ensure_single_segment(release_id.as_str())?;
                let project_id = request
                    .project_id
                    .clone()
                    .unwrap_or_else(|| ProjectId::new(document.active_project.clone()));
                self.gate.check(&project_id, &release_id, request.at)?;
                Ok((from, Some(release_id)))
            }
            _ => Ok((from, None)),
        }
    }

    /// Records an applied change.
    fn record_change(&self, outcome: &TransitionOutcome, actor: &str, at: UtcTimestamp) {
        self.audit.record(&AuditEvent::StatusChanged {
            at,
            shot_id: outcome.shot_id.clone(),
            from: outcome.from,
            to: outcome.to,
            actor: actor.to_string(),
        });
    }
}

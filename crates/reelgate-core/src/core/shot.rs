// crates/reelgate-core/src/core/shot.rs
// ============================================================================
// Module: Reelgate Shot Model
// Description: Shot lifecycle statuses, history entries, and the state document.
// Purpose: Provide the canonical persisted shape of the production tracker.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A state document tracks every shot in a project. Each shot carries a
//! [`ShotStatus`], named output artifacts, and an append-only history. The
//! transition table in [`ShotStatus::allowed_next`] is the single source of
//! truth for which status changes exist; guards are enforced by
//! [`crate::runtime::ShotStateMachine`].
//!
//! Unknown keys at the document and shot level are preserved on save.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::error::PipelineError;
use crate::core::identifiers::ReleaseId;
use crate::core::identifiers::ShotId;
use crate::core::time::UtcTimestamp;

// ============================================================================
// SECTION: Well-Known Outputs
// ============================================================================

/// Output key of the preview render.
pub const PREVIEW_OUTPUT_KEY: &str = "preview.mp4";
/// Output key of the QC report.
pub const QC_OUTPUT_KEY: &str = "qc.json";
/// Output keys required before a shot can be released.
pub const REQUIRED_RELEASE_OUTPUTS: [&str; 2] = [QC_OUTPUT_KEY, PREVIEW_OUTPUT_KEY];
/// Actor recorded for events emitted by the tool itself.
pub const SYSTEM_ACTOR: &str = "system";

// ============================================================================
// SECTION: Status
// ============================================================================

/// Lifecycle status of a shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShotStatus {
    /// Planned but not started.
    Planned,
    /// Work in progress.
    InProgress,
    /// Awaiting quality control.
    Qc,
    /// Passed quality control.
    Done,
    /// Published in a verified release. Terminal.
    Release,
    /// Blocked on an external dependency.
    Blocked,
    /// Queued for another attempt.
    Retry,
    /// Abandoned. Terminal.
    Fail,
}

impl ShotStatus {
    /// Every status in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Planned,
        Self::InProgress,
        Self::Qc,
        Self::Done,
        Self::Release,
        Self::Blocked,
        Self::Retry,
        Self::Fail,
    ];

    /// Returns the persisted label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "PLANNED",
            Self::InProgress => "IN_PROGRESS",
            Self::Qc => "QC",
            Self::Done => "DONE",
            Self::Release => "RELEASE",
            Self::Blocked => "BLOCKED",
            Self::Retry => "RETRY",
            Self::Fail => "FAIL",
        }
    }

    /// Parses a persisted label. Matching is case-insensitive.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        let upper = label.trim().to_ascii_uppercase();
        Self::ALL.into_iter().find(|status| status.as_str() == upper)
    }

    /// Returns the statuses reachable in one step.
    #[must_use]
    pub const fn allowed_next(self) -> &'static [Self] {
        match self {
            Self::Planned => &[Self::InProgress],
            Self::InProgress => &[Self::Qc, Self::Blocked, Self::Fail],
            Self::Qc => &[Self::Done, Self::Retry, Self::Blocked, Self::Fail],
            Self::Retry | Self::Blocked => &[Self::InProgress, Self::Fail],
            Self::Done => &[Self::Release],
            Self::Release | Self::Fail => &[],
        }
    }

    /// Returns true when no transitions leave this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        self.allowed_next().is_empty()
    }

    /// Returns true when `to` is reachable in one step.
    #[must_use]
    pub fn can_transition_to(self, to: Self) -> bool {
        self.allowed_next().contains(&to)
    }
}

impl fmt::Display for ShotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: History
// ============================================================================

/// Kind of a history event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryEventKind {
    /// Shot was created.
    Created,
    /// Planning decision recorded at creation.
    PlanningDecision,
    /// Status changed through the state machine.
    StatusChanged,
    /// Render output was produced.
    Rendered,
    /// An output artifact was attached.
    OutputAttached,
}

impl HistoryEventKind {
    /// Every event kind.
    pub const ALL: [Self; 5] = [
        Self::Created,
        Self::PlanningDecision,
        Self::StatusChanged,
        Self::Rendered,
        Self::OutputAttached,
    ];

    /// Returns the persisted label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::PlanningDecision => "PLANNING_DECISION",
            Self::StatusChanged => "STATUS_CHANGED",
            Self::Rendered => "RENDERED",
            Self::OutputAttached => "OUTPUT_ATTACHED",
        }
    }
}

/// Append-only history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Event kind.
    pub event: HistoryEventKind,
    /// Previous status for status changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ShotStatus>,
    /// New status for status changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<ShotStatus>,
    /// When the event happened.
    pub at: UtcTimestamp,
    /// Who caused the event.
    pub by: String,
    /// Optional free-form note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl HistoryEntry {
    /// Builds an entry without status fields.
    #[must_use]
    pub fn event(
        event: HistoryEventKind,
        at: UtcTimestamp,
        by: impl Into<String>,
        note: Option<String>,
    ) -> Self {
        Self {
            event,
            from: None,
            to: None,
            at,
            by: by.into(),
            note,
        }
    }

    /// Builds a status change entry.
    #[must_use]
    pub fn status_changed(
        from: ShotStatus,
        to: ShotStatus,
        at: UtcTimestamp,
        by: impl Into<String>,
        note: Option<String>,
    ) -> Self {
        Self {
            event: HistoryEventKind::StatusChanged,
            from: Some(from),
            to: Some(to),
            at,
            by: by.into(),
            note,
        }
    }
}

// ============================================================================
// SECTION: Shot
// ============================================================================

/// A single shot tracked by the state document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    /// Shot identifier; equals its key in the document.
    pub id: ShotId,
    /// Production phase label.
    pub phase: String,
    /// Current lifecycle status.
    pub status: ShotStatus,
    /// Free-form inputs such as the prompt.
    #[serde(default)]
    pub inputs: BTreeMap<String, Value>,
    /// Output key to path relative to the state document directory.
    #[serde(default)]
    pub outputs: BTreeMap<String, String>,
    /// Append-only history.
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    /// Release the shot was promoted into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<ReleaseId>,
    /// Unknown keys preserved across saves.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Shot {
    /// Builds a freshly planned shot with its creation history.
    #[must_use]
    pub fn planned(
        id: ShotId,
        phase: impl Into<String>,
        prompt: impl Into<String>,
        at: UtcTimestamp,
        actor: &str,
    ) -> Self {
        let mut inputs = BTreeMap::new();
        inputs.insert("prompt".to_string(), Value::String(prompt.into()));
        Self {
            id,
            phase: phase.into(),
            status: ShotStatus::Planned,
            inputs,
            outputs: BTreeMap::new(),
            history: vec![
                HistoryEntry::event(HistoryEventKind::Created, at, SYSTEM_ACTOR, None),
                HistoryEntry::event(
                    HistoryEventKind::PlanningDecision,
                    at,
                    actor,
                    Some("initial shot planning completed".to_string()),
                ),
            ],
            release: None,
            extra: BTreeMap::new(),
        }
    }

    /// Returns the recorded output path for a key, ignoring blank values.
    #[must_use]
    pub fn output(&self, key: &str) -> Option<&str> {
        self.outputs.get(key).map(String::as_str).filter(|path| !path.trim().is_empty())
    }

    /// Returns the prompt input when present.
    #[must_use]
    pub fn prompt(&self) -> Option<&str> {
        self.inputs.get("prompt").and_then(Value::as_str)
    }
}

// ============================================================================
// SECTION: State Document
// ============================================================================

/// Top-level persisted state of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDocument {
    /// Active project identifier (`project` is accepted on read).
    #[serde(alias = "project")]
    pub active_project: String,
    /// Current creative focus.
    pub current_focus: String,
    /// Last mutation time.
    pub last_updated_utc: UtcTimestamp,
    /// Default release identifier for promotions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_release: Option<ReleaseId>,
    /// Shots keyed by identifier.
    pub shots: BTreeMap<String, Shot>,
    /// Unknown keys preserved across saves.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl StateDocument {
    /// Creates an empty document.
    #[must_use]
    pub fn new(active_project: impl Into<String>, at: UtcTimestamp) -> Self {
        Self {
            active_project: active_project.into(),
            current_focus: String::new(),
            last_updated_utc: at,
            active_release: None,
            shots: BTreeMap::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Checks that every shot key matches its embedded identifier.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Invalid`] naming the first mismatched key.
    pub fn validate_keys(&self) -> Result<(), PipelineError> {
        for (key, shot) in &self.shots {
            if key != shot.id.as_str() {
                return Err(PipelineError::Invalid(format!(
                    "shot key {key} does not match id {}",
                    shot.id
                )));
            }
        }
        Ok(())
    }

    /// Looks up a shot.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NotFound`] when the shot is unknown.
    pub fn shot(&self, id: &ShotId) -> Result<&Shot, PipelineError> {
        self.shots
            .get(id.as_str())
            .ok_or_else(|| PipelineError::NotFound(format!("shot {id}")))
    }

    /// Looks up a shot for mutation.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NotFound`] when the shot is unknown.
    pub fn shot_mut(&mut self, id: &ShotId) -> Result<&mut Shot, PipelineError> {
        self.shots
            .get_mut(id.as_str())
            .ok_or_else(|| PipelineError::NotFound(format!("shot {id}")))
    }

    /// Returns shots with the given status in identifier order.
    pub fn shots_with_status(&self, status: ShotStatus) -> impl Iterator<Item = &Shot> {
        self.shots.values().filter(move |shot| shot.status == status)
    }

    /// Records a mutation time.
    pub const fn touch(&mut self, at: UtcTimestamp) {
        self.last_updated_utc = at;
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

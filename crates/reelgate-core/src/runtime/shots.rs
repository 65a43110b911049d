// crates/reelgate-core/src/runtime/shots.rs
// ============================================================================
// Module: Reelgate Shot Tracker
// Description: Shot creation, output bookkeeping, rendering, and listings.
// Purpose: Mutate shots outside the status lifecycle with the same discipline.
// Dependencies: crate::{core, interfaces}, serde_json
// ============================================================================

//! ## Overview
//! These operations never change a shot's status. Each one validates first,
//! then mutates one loaded document and saves it whole. Outputs of shots in a
//! terminal status are frozen, and when the project policy declares
//! `immutable_outputs` an output already recorded on a DONE shot cannot be
//! repointed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use serde_json::Value;

use crate::core::audit::AuditEvent;
use crate::core::error::PipelineError;
use crate::core::identifiers::ShotId;
use crate::core::paths::ensure_safe_relative;
use crate::core::paths::ensure_single_segment;
use crate::core::paths::resolve_within;
use crate::core::shot::HistoryEntry;
use crate::core::shot::HistoryEventKind;
use crate::core::shot::PREVIEW_OUTPUT_KEY;
use crate::core::shot::Shot;
use crate::core::shot::ShotStatus;
use crate::core::shot::StateDocument;
use crate::core::time::UtcTimestamp;
use crate::interfaces::AuditSink;
use crate::interfaces::StateDocumentStore;
use crate::runtime::files::ExistingTarget;
use crate::runtime::files::copy_file_verified;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Phase assigned to new shots when none is given.
pub const DEFAULT_PHASE: &str = "FAZ_1";
/// Maximum prompt characters shown in listings.
pub const PROMPT_PREVIEW_CHARS: usize = 60;

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Request to add a shot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShotRequest {
    /// Shot identifier.
    pub shot_id: ShotId,
    /// Production phase.
    pub phase: String,
    /// Generation prompt.
    pub prompt: String,
    /// Acting user.
    pub actor: String,
    /// Event time.
    pub at: UtcTimestamp,
}

/// Request to record an output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachOutputRequest {
    /// Shot identifier.
    pub shot_id: ShotId,
    /// Output key.
    pub key: String,
    /// Path relative to the state document directory.
    pub path: String,
    /// Acting user.
    pub actor: String,
    /// Event time.
    pub at: UtcTimestamp,
    /// Optional history note.
    pub note: Option<String>,
}

/// Request to copy a render into the tree and record it as the preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// Shot identifier.
    pub shot_id: ShotId,
    /// Rendered file to copy in.
    pub source: PathBuf,
    /// Output directory relative to the state document directory.
    pub out_dir: String,
    /// Acting user.
    pub actor: String,
    /// Event time.
    pub at: UtcTimestamp,
}

/// Result of an output change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachOutcome {
    /// Recorded relative path.
    pub path: String,
    /// False when the output already pointed at `path`.
    pub changed: bool,
}

/// Listing filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShotFilter {
    /// Keep only shots in this status.
    pub status: Option<ShotStatus>,
    /// Keep only shots in this phase.
    pub phase: Option<String>,
}

/// One listed shot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotRow {
    /// Shot identifier.
    pub shot_id: ShotId,
    /// Production phase.
    pub phase: String,
    /// Current status.
    pub status: ShotStatus,
    /// Number of recorded outputs.
    pub outputs: usize,
    /// Prompt truncated for display.
    pub prompt: String,
}

/// Filtered listing with whole-document counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotListing {
    /// Matching shots in identifier order.
    pub rows: Vec<ShotRow>,
    /// Number of shots in the document.
    pub total: usize,
    /// Number of DONE shots in the document.
    pub done: usize,
}

// ============================================================================
// SECTION: Tracker
// ============================================================================

/// Shot bookkeeping over a state document store.
pub struct ShotTracker<S, A> {
    /// State document store.
    store: S,
    /// Audit sink.
    audit: A,
    /// Whether DONE outputs may not be repointed.
    immutable_outputs: bool,
}

impl<S, A> ShotTracker<S, A>
where
    S: StateDocumentStore,
    A: AuditSink,
{
    /// Creates a tracker.
    #[must_use]
    pub const fn new(store: S, audit: A, immutable_outputs: bool) -> Self {
        Self {
            store,
            audit,
            immutable_outputs,
        }
    }

    /// Adds a new PLANNED shot.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::AlreadyExists`] for a duplicate id and
    /// [`PipelineError::UnsafePath`] when the id is not a single path segment.
    pub fn create_shot(&self, request: &NewShotRequest) -> Result<(), PipelineError> {
        ensure_single_segment(request.shot_id.as_str())?;
        let mut document = self.store.load()?;
        if document.shots.contains_key(request.shot_id.as_str()) {
            return Err(PipelineError::AlreadyExists(format!("shot {}", request.shot_id)));
        }
        let phase = if request.phase.trim().is_empty() { DEFAULT_PHASE } else { &request.phase };
        document.shots.insert(
            request.shot_id.as_str().to_string(),
            Shot::planned(
                request.shot_id.clone(),
                phase,
                request.prompt.clone(),
                request.at,
                &request.actor,
            ),
        );
        document.touch(request.at);
        self.store.save(&document)?;
        self.audit.record(&AuditEvent::ShotCreated {
            at: request.at,
            shot_id: request.shot_id.clone(),
            actor: request.actor.clone(),
        });
        Ok(())
    }

    /// Records an output path on a shot.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] when the shot is unknown, the key or path is
    /// unsafe, or the shot's outputs are frozen.
    pub fn attach_output(
        &self,
        request: &AttachOutputRequest,
    ) -> Result<AttachOutcome, PipelineError> {
        self.record_output(request, HistoryEventKind::OutputAttached)
    }

    /// Copies a rendered file under `out_dir` and records it as the preview.
    ///
    /// Re-rendering identical content is accepted without rewriting the file.
    /// New bytes behind an unchanged path still append a `RENDERED` entry, and
    /// under immutable outputs a DONE shot's preview cannot be replaced.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] when the source is missing, the output
    /// directory is unsafe, or the shot's outputs are frozen.
    pub fn render(&self, request: &RenderRequest) -> Result<AttachOutcome, PipelineError> {
        ensure_safe_relative(&request.out_dir)?;
        if !request.source.is_file() {
            return Err(PipelineError::NotFound(format!(
                "render source {}",
                request.source.display()
            )));
        }
        let relative = format!("{}/{PREVIEW_OUTPUT_KEY}", request.out_dir.trim().trim_end_matches('/'));
        let attach = AttachOutputRequest {
            shot_id: request.shot_id.clone(),
            key: PREVIEW_OUTPUT_KEY.to_string(),
            path: relative,
            actor: request.actor.clone(),
            at: request.at,
            note: Some(format!("rendered from {}", request.source.display())),
        };
        let document = self.store.load()?;
        self.check_output_change(&document, &attach)?;
        let frozen =
            self.immutable_outputs && document.shot(&attach.shot_id)?.status == ShotStatus::Done;
        let existing = if frozen { ExistingTarget::Reject } else { ExistingTarget::Replace };
        let dest = resolve_within(self.store.base_dir(), &attach.path)?;
        let copied = copy_file_verified(&request.source, &dest, existing).map_err(|err| match err {
            PipelineError::AlreadyExists(detail) if frozen => {
                PipelineError::PolicyViolation(format!(
                    "policy.immutable_outputs forbids re-rendering outputs['{PREVIEW_OUTPUT_KEY}'] \
                     of DONE shot {}: {detail}",
                    attach.shot_id
                ))
            }
            other => other,
        })?;
        self.apply_output(&attach, HistoryEventKind::Rendered, copied.written)
    }

    /// Lists shots matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] when the document cannot be loaded.
    pub fn list_shots(&self, filter: &ShotFilter) -> Result<ShotListing, PipelineError> {
        let document = self.store.load()?;
        Ok(list_shots(&document, filter))
    }

    /// Validates and applies an output change.
    fn record_output(
        &self,
        request: &AttachOutputRequest,
        event: HistoryEventKind,
    ) -> Result<AttachOutcome, PipelineError> {
        self.apply_output(request, event, false)
    }

    /// Applies an output change; `content_written` records new bytes behind
    /// an unchanged path.
    fn apply_output(
        &self,
        request: &AttachOutputRequest,
        event: HistoryEventKind,
        content_written: bool,
    ) -> Result<AttachOutcome, PipelineError> {
        let mut document = self.store.load()?;
        self.check_output_change(&document, request)?;
        let path = request.path.trim().to_string();
        let shot = document.shot_mut(&request.shot_id)?;
        if !content_written && shot.output(&request.key) == Some(path.as_str()) {
            return Ok(AttachOutcome {
                path,
                changed: false,
            });
        }
        shot.outputs.insert(request.key.clone(), path.clone());
        shot.history.push(HistoryEntry::event(
            event,
            request.at,
            request.actor.clone(),
            request.note.clone(),
        ));
        document.touch(request.at);
        self.store.save(&document)?;
        self.audit.record(&AuditEvent::OutputAttached {
            at: request.at,
            shot_id: request.shot_id.clone(),
            key: request.key.clone(),
            path: path.clone(),
            actor: request.actor.clone(),
        });
        Ok(AttachOutcome {
            path,
            changed: true,
        })
    }

    /// Rejects output changes the shot's status or project policy forbid.
    fn check_output_change(
        &self,
        document: &StateDocument,
        request: &AttachOutputRequest,
    ) -> Result<(), PipelineError> {
        ensure_single_segment(&request.key)?;
        ensure_safe_relative(&request.path)?;
        let shot = document.shot(&request.shot_id)?;
        if shot.status.is_terminal() {
            return Err(PipelineError::Invalid(format!(
                "shot {} is {}; its outputs are frozen",
                shot.id, shot.status
            )));
        }
        let current = shot.output(&request.key);
        let repointing = current.is_some_and(|path| path != request.path.trim());
        if self.immutable_outputs && shot.status == ShotStatus::Done && repointing {
            return Err(PipelineError::PolicyViolation(format!(
                "policy.immutable_outputs forbids changing outputs['{}'] of DONE shot {}",
                request.key, shot.id
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Listing
// ============================================================================

/// Builds a filtered listing of a document.
#[must_use]
pub fn list_shots(document: &StateDocument, filter: &ShotFilter) -> ShotListing {
    let rows = document
        .shots
        .values()
        .filter(|shot| filter.status.is_none_or(|status| shot.status == status))
        .filter(|shot| filter.phase.as_deref().is_none_or(|phase| shot.phase == phase))
        .map(|shot| ShotRow {
            shot_id: shot.id.clone(),
            phase: shot.phase.clone(),
            status: shot.status,
            outputs: shot.outputs.len(),
            prompt: truncate_prompt(shot.prompt().unwrap_or_default()),
        })
        .collect();
    ShotListing {
        rows,
        total: document.shots.len(),
        done: document.shots_with_status(ShotStatus::Done).count(),
    }
}

/// Shortens a prompt to [`PROMPT_PREVIEW_CHARS`] characters.
fn truncate_prompt(prompt: &str) -> String {
    let single_line = prompt.replace(['\n', '\r'], " ");
    if single_line.chars().count() <= PROMPT_PREVIEW_CHARS {
        return single_line;
    }
    let mut shortened: String = single_line.chars().take(PROMPT_PREVIEW_CHARS - 3).collect();
    shortened.push_str("...");
    shortened
}

// ============================================================================
// SECTION: Structural Validation
// ============================================================================

/// Top-level keys every state document must carry.
const REQUIRED_DOCUMENT_KEYS: [&str; 3] = ["current_focus", "last_updated_utc", "shots"];

/// Lists structural problems of a raw state document.
///
/// Checks required keys, the `Z` timestamp form, that `shots` is an object
/// keyed by each shot's own id, and that the document parses into the typed
/// model.
#[must_use]
pub fn validate_state_value(value: &Value) -> Vec<String> {
    let Some(object) = value.as_object() else {
        return vec!["state document must be a JSON object".to_string()];
    };
    let mut problems = Vec::new();
    if !object.contains_key("active_project") && !object.contains_key("project") {
        problems.push("missing key: active_project".to_string());
    }
    for key in REQUIRED_DOCUMENT_KEYS {
        if !object.contains_key(key) {
            problems.push(format!("missing key: {key}"));
        }
    }
    if let Some(stamp) = object.get("last_updated_utc") {
        let canonical = stamp.as_str().is_some_and(UtcTimestamp::is_canonical);
        if !canonical {
            problems.push(format!(
                "last_updated_utc must be a UTC timestamp like 2026-01-01T00:00:00Z, got {stamp}"
            ));
        }
    }
    match object.get("shots") {
        Some(Value::Object(shots)) => {
            for (key, shot) in shots {
                match shot.get("id").and_then(Value::as_str) {
                    Some(id) if id == key => {}
                    Some(id) => problems.push(format!("shots.{key}: id {id} does not match key")),
                    None => problems.push(format!("shots.{key}: missing id")),
                }
                if let Some(Value::Object(outputs)) = shot.get("outputs") {
                    for (output, path) in outputs {
                        if let Some(path) = path.as_str()
                            && !path.trim().is_empty()
                            && let Err(err) = ensure_safe_relative(path)
                        {
                            problems.push(format!("shots.{key}.outputs.{output}: {err}"));
                        }
                    }
                }
            }
        }
        Some(_) => problems.push("shots must be an object".to_string()),
        None => {}
    }
    if problems.is_empty()
        && let Err(err) = serde_json::from_value::<StateDocument>(value.clone())
    {
        problems.push(format!("state document does not match the model: {err}"));
    }
    problems
}

// ============================================================================
// SECTION: Tests
// ============================================================================

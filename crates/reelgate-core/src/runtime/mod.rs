// crates/reelgate-core/src/runtime/mod.rs
// ============================================================================
// Module: Reelgate Runtime
// Description: Pipeline operations over the core data model.
// Purpose: Drive shot transitions, release builds, verification, and bundles.
// Dependencies: crate::{core, interfaces}, tempfile
// ============================================================================

//! ## Overview
//! The runtime layers filesystem effects on top of the pure core types. Every
//! mutating operation validates its full input before writing and writes
//! whole files atomically. Wall-clock time never enters the runtime; callers
//! pass timestamps in their requests.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod bundle;
pub mod evidence;
pub mod files;
pub mod gate;
pub mod release;
pub mod shots;
pub mod store;
pub mod transition;
pub mod verifier;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::FileAuditSink;
pub use audit::MemoryAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use bundle::BundleMerger;
pub use bundle::BundleRequest;
pub use evidence::StructuralQcValidator;
pub use evidence::check_done_evidence;
pub use evidence::check_qc_report;
pub use gate::GateLayout;
pub use gate::GateReport;
pub use gate::GateRequest;
pub use gate::PolicyGate;
pub use release::BuiltRelease;
pub use release::ReleaseBuilder;
pub use release::ReleaseRequest;
pub use shots::AttachOutcome;
pub use shots::AttachOutputRequest;
pub use shots::NewShotRequest;
pub use shots::RenderRequest;
pub use shots::ShotFilter;
pub use shots::ShotListing;
pub use shots::ShotRow;
pub use shots::ShotTracker;
pub use shots::list_shots;
pub use shots::validate_state_value;
pub use store::FileStateStore;
pub use store::InMemoryStateStore;
pub use transition::PromoteOutcome;
pub use transition::PromoteRequest;
pub use transition::PromoteSelection;
pub use transition::ShotStateMachine;
pub use transition::TransitionOutcome;
pub use transition::TransitionRequest;
pub use verifier::IssueKind;
pub use verifier::ManifestVerifier;
pub use verifier::VerificationIssue;
pub use verifier::VerificationReport;
pub use verifier::VerificationStatus;
pub use verifier::VerifiedManifest;

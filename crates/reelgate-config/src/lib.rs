// crates/reelgate-config/src/lib.rs
// ============================================================================
// Module: Reelgate Config Library
// Description: Canonical reelgate.toml model and validation.
// Purpose: Single source of truth for tool configuration semantics.
// Dependencies: reelgate-core, serde, toml
// ============================================================================

//! ## Overview
//! `reelgate-config` defines the tool configuration for the `reelgate` CLI:
//! where releases and project files live, which audit sink receives events,
//! the actor recorded in shot history, and the default bundle conflict
//! policy. Loading is strict and fails closed on oversized, non UTF-8, or
//! unknown input.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::ActorConfig;
pub use config::AuditConfig;
pub use config::AuditSinkKind;
pub use config::BundleConfig;
pub use config::CONFIG_ENV_VAR;
pub use config::ConfigError;
pub use config::DEFAULT_CONFIG_NAME;
pub use config::PathsConfig;
pub use config::ReelgateConfig;

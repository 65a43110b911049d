// crates/reelgate-cli/src/i18n.rs
// ============================================================================
// Module: CLI Message Catalog
// Description: Provides the message catalog and formatting utilities for the CLI.
// Purpose: Centralize user-facing strings so output stays consistent.
// Dependencies: Standard library collections.
// ============================================================================

//! ## Overview
//! The reelgate CLI keeps user-facing strings in a small catalog. All runtime
//! output should be routed through the [`t!`](crate::t) macro.
//!
//! ## Invariants
//! - The catalog is initialized once and read-only thereafter.
//! - Missing keys fall back to the key itself.
//! - Placeholder substitutions preserve deterministic order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A formatted message argument captured by the [`macro@crate::t`] macro.
///
/// # Invariants
/// - `key` matches a placeholder name without braces (for example, `path`).
/// - `value` is preformatted and should be safe for display.
#[derive(Clone)]
pub struct MessageArg {
    /// The placeholder name used in message templates (e.g., `"path"`).
    pub key: &'static str,
    /// The formatted string value to substitute for this placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`] from a key and displayable value.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Static catalog entries.
const CATALOG: &[(&str, &str)] = &[
    ("main.version", "reelgate {version}"),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "output"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("error.pipeline", "[ERR] {kind}: {error}"),
    ("args.status_invalid", "unknown status: {value}"),
    ("args.conflict_policy_invalid", "unknown conflict policy: {value} (expected fail or latest)"),
    ("config.load_failed", "[ERR] failed to load config: {error}"),
    ("config.audit_failed", "[ERR] failed to open audit sink: {error}"),
    ("config.validate.ok", "[OK] config valid: {path}"),
    ("config.validate.defaults", "[OK] no config file found; built-in defaults apply"),
    ("context.cwd_failed", "[ERR] cannot read working directory: {error}"),
    ("contract.init_failed", "[ERR] failed to prepare schema validators: {error}"),
    ("validate.parse_failed", "[FAIL] {path} is not valid JSON: {error}"),
    ("validate.ok", "[OK] state document valid: {path}"),
    ("validate.failed", "[FAIL] Validation errors ({count}):"),
    ("validate.problem", "  - {problem}"),
    ("newshot.ok", "[OK] created shot {shot}"),
    ("attach.ok", "[OK] {shot}: outputs[{key}] = {path}"),
    ("attach.unchanged", "[OK] {shot}: outputs[{key}] already {path}"),
    ("render.ok", "[OK] {shot}: wrote {path}"),
    ("transition.ok", "[OK] {shot}: {from} -> {to}"),
    ("promote.ok", "[OK] promoted {count} shot(s) into {release}: {shots}"),
    ("promote.skipped", "[SKIP] already released: {shots}"),
    ("listshots.prompt_column", "PROMPT"),
    ("listshots.summary", "TOTAL shots: {total} | DONE: {done}"),
    ("release.ok", "[OK] release created: {path}"),
    ("release.shots", "[OK] DONE shots: {count}"),
    ("release.manifest", "[OK] manifest: {path}"),
    ("manifest.ok", "[OK] manifest written: {path} ({count} artifacts)"),
    ("manifest.outside_root", "[ERR] invalid: state document directory {path} is not the repository root {root}; artifact-list paths would not resolve"),
    ("manifest.root_unreadable", "[ERR] cannot resolve {path}: {error}"),
    ("verify.ok", "[OK] manifest verified: {path} ({count} files)"),
    ("verify.failed", "[FAIL] manifest verification failed: {path}"),
    ("verify.empty", "  - empty: manifest declares no artifacts"),
    ("verify.issue", "  - {kind} {path}: {detail}"),
    ("verify.render_failed", "[ERR] failed to render verification report: {error}"),
    ("gate.ok", "[OK] release gate passed: {release} ({count} files verified)"),
    ("bundle.ok", "[OK] bundle created: {path} ({shots} shots, {files} files)"),
];

/// Returns the message catalog.
pub(crate) fn catalog() -> &'static HashMap<&'static str, &'static str> {
    static CATALOG_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    CATALOG_MAP.get_or_init(|| CATALOG.iter().copied().collect())
}

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Formats `key` while substituting `args`.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    let template = catalog().get(key).copied().unwrap_or(key);
    if args.is_empty() {
        return template.to_string();
    }

    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a catalog message from a key and named arguments.
///
/// # Arguments
///
/// - `$key` must match a catalog entry.
/// - Named arguments are substituted into `{placeholder}` positions.
///
/// # Returns
///
/// A [`String`] with placeholders substituted.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_substituted() {
        let message = translate(
            "transition.ok",
            vec![
                MessageArg::new("shot", "SH001"),
                MessageArg::new("from", "QC"),
                MessageArg::new("to", "DONE"),
            ],
        );
        assert_eq!(message, "[OK] SH001: QC -> DONE");
    }

    #[test]
    fn unknown_keys_fall_back_to_the_key() {
        assert_eq!(translate("missing.key", Vec::new()), "missing.key");
    }

    #[test]
    fn catalog_keys_are_unique() {
        assert_eq!(catalog().len(), CATALOG.len());
    }
}

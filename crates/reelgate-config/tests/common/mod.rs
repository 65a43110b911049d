// crates/reelgate-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for reelgate-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use reelgate_config::ConfigError;
use reelgate_config::ReelgateConfig;

/// Parses and validates a TOML string.
pub fn config_from_toml(toml_str: &str) -> Result<ReelgateConfig, ConfigError> {
    ReelgateConfig::from_bytes(toml_str.as_bytes())
}

/// Asserts that `result` is an error whose message contains `needle`.
pub fn assert_invalid(result: Result<ReelgateConfig, ConfigError>, needle: &str) -> Result<(), String> {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}

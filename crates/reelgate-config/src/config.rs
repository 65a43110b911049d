// crates/reelgate-config/src/config.rs
// ============================================================================
// Module: Reelgate Configuration
// Description: Configuration loading and validation for the reelgate tool.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: reelgate-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is read from a TOML file resolved from an explicit path, the
//! `REELGATE_CONFIG` environment variable, or `./reelgate.toml`. Only the
//! implicit default may be absent, in which case built-in defaults apply.
//! Every configured path is relative to the repository root and may not
//! escape it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use reelgate_core::AuditSink;
use reelgate_core::ConflictPolicy;
use reelgate_core::FileAuditSink;
use reelgate_core::GateLayout;
use reelgate_core::NoopAuditSink;
use reelgate_core::StderrAuditSink;
use reelgate_core::core::paths::ensure_safe_relative;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "reelgate.toml";
/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "REELGATE_CONFIG";
/// Maximum config file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum length of a path string.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum actor label length in bytes.
pub(crate) const MAX_ACTOR_LENGTH: usize = 64;
/// Default releases directory.
const DEFAULT_RELEASES_DIR: &str = "releases";
/// Default projects directory.
const DEFAULT_PROJECTS_DIR: &str = "projects";
/// Default actor label.
const DEFAULT_ACTOR: &str = "cli";

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Tool configuration loaded from `reelgate.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReelgateConfig {
    /// Directory layout.
    #[serde(default)]
    pub paths: PathsConfig,
    /// Audit sink selection.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Actor recorded in shot history.
    #[serde(default)]
    pub actor: ActorConfig,
    /// Bundle defaults.
    #[serde(default)]
    pub bundle: BundleConfig,
    /// File the configuration was read from; `None` for built-in defaults.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl ReelgateConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, explicit) = resolve_path(path, env::var_os(CONFIG_ENV_VAR))?;
        validate_path(&resolved)?;
        if !explicit && !resolved.exists() {
            return Ok(Self::default());
        }
        let bytes = fs::read(&resolved).map_err(|err| {
            ConfigError::Io(format!("{}: {err}", resolved.display()))
        })?;
        let mut config = Self::from_bytes(&bytes)?;
        config.source = Some(resolved);
        Ok(config)
    }

    /// Parses and validates configuration bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the bytes are oversized, not UTF-8, not
    /// valid TOML, or fail validation.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.paths.validate()?;
        self.audit.validate()?;
        self.actor.validate()
    }

    /// Returns the gate layout rooted at `repo_root`.
    #[must_use]
    pub fn gate_layout(&self, repo_root: &Path) -> GateLayout {
        GateLayout {
            repo_root: repo_root.to_path_buf(),
            projects_dir: self.paths.projects_dir.clone(),
            releases_dir: self.paths.releases_dir.clone(),
        }
    }
}

/// Directory layout relative to the repository root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    /// Directory that receives release directories.
    #[serde(default = "default_releases_dir")]
    pub releases_dir: String,
    /// Directory holding `<project>/project.json`.
    #[serde(default = "default_projects_dir")]
    pub projects_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            releases_dir: default_releases_dir(),
            projects_dir: default_projects_dir(),
        }
    }
}

impl PathsConfig {
    /// Validates directory paths.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_relative_path("paths.releases_dir", &self.releases_dir)?;
        validate_relative_path("paths.projects_dir", &self.projects_dir)
    }

    /// Returns the releases directory under `repo_root`.
    #[must_use]
    pub fn releases_root(&self, repo_root: &Path) -> PathBuf {
        repo_root.join(&self.releases_dir)
    }
}

/// Audit sink selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Discard events.
    None,
}

/// Audit configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Sink receiving audit events.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Log file relative to the repository root; required for `file`.
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditConfig {
    /// Validates the sink selection.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::File, None) => Err(ConfigError::Invalid(
                "audit.path must be set when audit.sink = \"file\"".to_string(),
            )),
            (_, Some(path)) => validate_relative_path("audit.path", path),
            (_, None) => Ok(()),
        }
    }

    /// Opens the configured sink, creating the log directory when needed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the log file cannot be opened.
    pub fn open_sink(&self, repo_root: &Path) -> Result<Box<dyn AuditSink>, ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::Stderr, _) => Ok(Box::new(StderrAuditSink)),
            (AuditSinkKind::None, _) => Ok(Box::new(NoopAuditSink)),
            (AuditSinkKind::File, Some(path)) => {
                let target = repo_root.join(path);
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent).map_err(|err| {
                        ConfigError::Io(format!("{}: {err}", parent.display()))
                    })?;
                }
                let sink = FileAuditSink::new(&target)
                    .map_err(|err| ConfigError::Io(format!("{}: {err}", target.display())))?;
                Ok(Box::new(sink))
            }
            (AuditSinkKind::File, None) => Err(ConfigError::Invalid(
                "audit.path must be set when audit.sink = \"file\"".to_string(),
            )),
        }
    }
}

/// Actor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ActorConfig {
    /// Label recorded as the history `by` field.
    #[serde(default = "default_actor")]
    pub name: String,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            name: default_actor(),
        }
    }
}

impl ActorConfig {
    /// Validates the actor label.
    fn validate(&self) -> Result<(), ConfigError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ConfigError::Invalid("actor.name must be non-empty".to_string()));
        }
        if self.name.len() > MAX_ACTOR_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "actor.name exceeds {MAX_ACTOR_LENGTH} bytes"
            )));
        }
        Ok(())
    }
}

/// Bundle defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BundleConfig {
    /// Conflict policy used when the command line does not pick one.
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Default releases directory.
fn default_releases_dir() -> String {
    DEFAULT_RELEASES_DIR.to_string()
}

/// Default projects directory.
fn default_projects_dir() -> String {
    DEFAULT_PROJECTS_DIR.to_string()
}

/// Default actor label.
fn default_actor() -> String {
    DEFAULT_ACTOR.to_string()
}

/// Resolves the config path and whether it was named explicitly.
fn resolve_path(
    path: Option<&Path>,
    env_value: Option<OsString>,
) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Some(env_path) = env_value.filter(|value| !value.is_empty()) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured path that must stay under the repository root.
fn validate_relative_path(field: &str, value: &str) -> Result<(), ConfigError> {
    ensure_safe_relative(value).map_err(|err| ConfigError::Invalid(format!("{field}: {err}")))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

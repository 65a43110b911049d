// crates/reelgate-core/src/core/paths.rs
// ============================================================================
// Module: Reelgate Path Safety
// Description: Validation of relative artifact paths and directory names.
// Purpose: Keep every cross-file reference inside its declared root.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! All references stored in state documents and manifests are POSIX-style
//! relative paths. Absolute paths, drive prefixes and `..` segments are
//! rejected everywhere, and resolved paths that exist are canonicalized so a
//! symlink cannot lead outside the declared root.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum length of a single path component.
pub const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum length of a full relative path.
pub const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Path validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// Path is empty.
    #[error("path is empty")]
    Empty,
    /// Path is absolute or carries a drive prefix.
    #[error("absolute path not allowed: {0}")]
    Absolute(String),
    /// Path contains a parent segment or resolves outside its root.
    #[error("path escapes its root: {0}")]
    Escapes(String),
    /// Path exceeds length limits.
    #[error("path exceeds length limits: {0}")]
    TooLong(String),
    /// Value must be a single directory or file name.
    #[error("not a single path segment: {0}")]
    NotSegment(String),
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates that `path` is a safe POSIX-style relative path.
///
/// Backslashes are treated as separators so Windows-style escapes are caught
/// on every platform.
///
/// # Errors
///
/// Returns [`PathError`] when the path is empty, absolute, contains `..`, or
/// exceeds length limits.
pub fn ensure_safe_relative(path: &str) -> Result<(), PathError> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(PathError::Empty);
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(PathError::TooLong(path.to_string()));
    }
    let normalized = trimmed.replace('\\', "/");
    if normalized.starts_with('/') || has_drive_prefix(&normalized) {
        return Err(PathError::Absolute(path.to_string()));
    }
    for segment in normalized.split('/') {
        if segment == ".." {
            return Err(PathError::Escapes(path.to_string()));
        }
        if segment.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(PathError::TooLong(path.to_string()));
        }
    }
    for component in Path::new(trimmed).components() {
        match component {
            Component::ParentDir => return Err(PathError::Escapes(path.to_string())),
            Component::Prefix(_) | Component::RootDir => {
                return Err(PathError::Absolute(path.to_string()));
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }
    Ok(())
}

/// Validates that `name` is usable as a single directory or file name.
///
/// # Errors
///
/// Returns [`PathError::NotSegment`] when the name is empty, `.`/`..`, or
/// contains a separator.
pub fn ensure_single_segment(name: &str) -> Result<(), PathError> {
    let invalid = name.trim().is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || has_drive_prefix(name)
        || name.len() > MAX_PATH_COMPONENT_LENGTH;
    if invalid {
        return Err(PathError::NotSegment(name.to_string()));
    }
    Ok(())
}

/// Resolves a safe relative path under `root`.
///
/// When the target already exists it is canonicalized and must remain under
/// the canonical root, which rejects symlink escapes.
///
/// # Errors
///
/// Returns [`PathError`] when the path is unsafe or escapes `root`.
pub fn resolve_within(root: &Path, relative: &str) -> Result<PathBuf, PathError> {
    ensure_safe_relative(relative)?;
    let joined = root.join(relative.trim().replace('\\', "/"));
    if let (Ok(canonical_root), Ok(canonical_target)) = (root.canonicalize(), joined.canonicalize())
        && !canonical_target.starts_with(&canonical_root)
    {
        return Err(PathError::Escapes(relative.to_string()));
    }
    Ok(joined)
}

/// Returns true when the path starts with a Windows drive prefix such as `C:`.
fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

// ============================================================================
// SECTION: Tests
// ============================================================================

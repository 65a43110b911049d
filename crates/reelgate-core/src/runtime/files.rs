// crates/reelgate-core/src/runtime/files.rs
// ============================================================================
// Module: Reelgate File Operations
// Description: Bounded reads, atomic writes, and hash-verified copies.
// Purpose: Centralize the filesystem discipline shared by every operation.
// Dependencies: tempfile
// ============================================================================

//! ## Overview
//! Writes go through a temporary file in the destination directory followed
//! by a rename, so readers never observe a partial file. Write-once outputs
//! use a no-clobber rename and fail when the destination exists. Copies are
//! re-hashed at the destination; a destination that already holds identical
//! content is accepted without rewriting.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::io;
use std::io::Read;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::core::error::PipelineError;
use crate::core::hashing::FileDigest;
use crate::core::hashing::digest_file;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a state document.
pub const MAX_STATE_DOCUMENT_BYTES: usize = 16 * 1024 * 1024;
/// Maximum size of a manifest.
pub const MAX_MANIFEST_BYTES: usize = 16 * 1024 * 1024;
/// Maximum size of a project file.
pub const MAX_PROJECT_FILE_BYTES: usize = 1024 * 1024;
/// Maximum size of a QC report.
pub const MAX_QC_REPORT_BYTES: usize = 4 * 1024 * 1024;

// ============================================================================
// SECTION: Reads
// ============================================================================

/// Reads a file while enforcing a hard size limit.
///
/// # Errors
///
/// Returns [`PipelineError::NotFound`] when the file is missing,
/// [`PipelineError::Invalid`] when it exceeds `max_bytes`, and
/// [`PipelineError::Io`] otherwise.
pub fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, PipelineError> {
    let file = File::open(path).map_err(|err| io_failure(path, &err))?;
    let metadata = file.metadata().map_err(|err| io_failure(path, &err))?;
    if !metadata.is_file() {
        return Err(PipelineError::NotFound(format!("{} is not a file", path.display())));
    }
    let size = metadata.len();
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    if size > limit {
        return Err(too_large(path, size, max_bytes));
    }
    let mut limited = file.take(limit.saturating_add(1));
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(|err| io_failure(path, &err))?;
    if bytes.len() > max_bytes {
        return Err(too_large(path, u64::try_from(bytes.len()).unwrap_or(u64::MAX), max_bytes));
    }
    Ok(bytes)
}

// ============================================================================
// SECTION: Writes
// ============================================================================

/// Replaces `path` atomically with `bytes`.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] when the write or rename fails.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PipelineError> {
    let temp = write_temp_beside(path, bytes)?;
    temp.persist(path).map_err(|err| io_failure(path, &err.error))?;
    Ok(())
}

/// Writes `bytes` to `path` atomically, refusing to replace an existing file.
///
/// # Errors
///
/// Returns [`PipelineError::AlreadyExists`] when `path` exists and
/// [`PipelineError::Io`] when the write fails.
pub fn write_new_atomic(path: &Path, bytes: &[u8]) -> Result<(), PipelineError> {
    if path.exists() {
        return Err(PipelineError::AlreadyExists(path.display().to_string()));
    }
    let temp = write_temp_beside(path, bytes)?;
    temp.persist_noclobber(path).map_err(|err| io_failure(path, &err.error))?;
    Ok(())
}

/// Writes bytes into a synced temporary file in the destination directory.
fn write_temp_beside(path: &Path, bytes: &[u8]) -> Result<NamedTempFile, PipelineError> {
    let parent = parent_dir(path);
    fs::create_dir_all(parent).map_err(|err| io_failure(parent, &err))?;
    let mut temp = NamedTempFile::new_in(parent).map_err(|err| io_failure(parent, &err))?;
    temp.write_all(bytes).map_err(|err| io_failure(path, &err))?;
    temp.flush().map_err(|err| io_failure(path, &err))?;
    temp.as_file().sync_all().map_err(|err| io_failure(path, &err))?;
    Ok(temp)
}

// ============================================================================
// SECTION: Copies
// ============================================================================

/// Behavior when a copy destination already exists with different content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistingTarget {
    /// Fail with [`PipelineError::AlreadyExists`].
    Reject,
    /// Replace the destination atomically.
    Replace,
}

/// Result of a verified copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOutcome {
    /// Digest measured at the destination.
    pub digest: FileDigest,
    /// False when the destination already held identical content.
    pub written: bool,
}

/// Copies `source` to `dest` and re-hashes the destination.
///
/// # Errors
///
/// Returns [`PipelineError::NotFound`] when the source is missing,
/// [`PipelineError::AlreadyExists`] when a differing destination exists under
/// [`ExistingTarget::Reject`], and [`PipelineError::IntegrityMismatch`] when the
/// destination does not match the source after the copy.
pub fn copy_file_verified(
    source: &Path,
    dest: &Path,
    existing: ExistingTarget,
) -> Result<CopyOutcome, PipelineError> {
    let expected = digest_file(source)?;
    if dest.exists() {
        let current = digest_file(dest)?;
        if current == expected {
            return Ok(CopyOutcome {
                digest: current,
                written: false,
            });
        }
        if existing == ExistingTarget::Reject {
            return Err(PipelineError::AlreadyExists(format!(
                "{} exists with different content",
                dest.display()
            )));
        }
    }
    let parent = parent_dir(dest);
    fs::create_dir_all(parent).map_err(|err| io_failure(parent, &err))?;
    let mut temp = NamedTempFile::new_in(parent).map_err(|err| io_failure(parent, &err))?;
    let mut reader = File::open(source).map_err(|err| io_failure(source, &err))?;
    io::copy(&mut reader, &mut temp).map_err(|err| io_failure(dest, &err))?;
    temp.as_file().sync_all().map_err(|err| io_failure(dest, &err))?;
    match existing {
        ExistingTarget::Reject => {
            temp.persist_noclobber(dest).map_err(|err| io_failure(dest, &err.error))?;
        }
        ExistingTarget::Replace => {
            temp.persist(dest).map_err(|err| io_failure(dest, &err.error))?;
        }
    }
    let actual = digest_file(dest)?;
    if actual != expected {
        return Err(PipelineError::IntegrityMismatch {
            details: vec![format!(
                "{}: copied {} bytes sha256 {} but source has {} bytes sha256 {}",
                dest.display(),
                actual.size,
                actual.sha256,
                expected.size,
                expected.sha256
            )],
        });
    }
    Ok(CopyOutcome {
        digest: actual,
        written: true,
    })
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the directory holding `path`, defaulting to the current directory.
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Removes a partially written output directory after `err`.
///
/// A failed removal is folded into the returned error so the leftover
/// directory is reported rather than hidden.
pub(crate) fn discard_partial_dir(dir: &Path, err: PipelineError) -> PipelineError {
    match fs::remove_dir_all(dir) {
        Ok(()) => err,
        Err(cleanup) if cleanup.kind() == io::ErrorKind::NotFound => err,
        Err(cleanup) => err.with_detail(&format!(
            "partial output left at {}: {cleanup}",
            dir.display()
        )),
    }
}

/// Maps an I/O failure into a [`PipelineError`].
pub(crate) fn io_failure(path: &Path, err: &io::Error) -> PipelineError {
    match err.kind() {
        io::ErrorKind::NotFound => PipelineError::NotFound(path.display().to_string()),
        io::ErrorKind::AlreadyExists => PipelineError::AlreadyExists(path.display().to_string()),
        _ => PipelineError::Io(format!("{}: {err}", path.display())),
    }
}

/// Builds the oversize error.
fn too_large(path: &Path, size: u64, limit: usize) -> PipelineError {
    PipelineError::Invalid(format!(
        "{} is {size} bytes which exceeds the {limit} byte limit",
        path.display()
    ))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

//! Unified-diff application
//!
//! Wraps the external `patch` program. A successful run leaves a backup of
//! the untouched file next to it, which the idempotency guard uses as the
//! "already patched" marker.

use std::path::{Path, PathBuf};

use crate::config::defaults::{BACKUP_EXTENSION, REJECT_EXTENSION};
use crate::error::PatchError;
use crate::infra::process::{CommandLine, ProcessRunner};

/// Path of the backup `patch` writes for `original`
pub fn backup_path(original: &Path) -> PathBuf {
    with_suffix(original, BACKUP_EXTENSION)
}

/// Path of the rejected-hunks file `patch` writes when `original` fails to patch
pub fn reject_path(original: &Path) -> PathBuf {
    with_suffix(original, REJECT_EXTENSION)
}

fn with_suffix(original: &Path, suffix: &str) -> PathBuf {
    let mut name = original.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Build the command that applies `patch_file` to `original` in place
pub fn patch_command(original: &Path, patch_file: &Path) -> CommandLine {
    CommandLine::new("patch")
        .arg("--forward")
        .arg("--backup")
        .arg(format!("--suffix={BACKUP_EXTENSION}"))
        .arg(original)
        .arg(patch_file)
}

/// Apply a diff to a single file, leaving a backup behind
///
/// Any failure of the patch tool, including non-matching context, is
/// reported as [`PatchError::PatchApplicationFailed`]. The tool writes the
/// backup and a reject file even when it fails; cleaning them up is left to
/// the caller.
pub fn apply(runner: &ProcessRunner, original: &Path, patch_file: &Path) -> Result<(), PatchError> {
    runner
        .run(&patch_command(original, patch_file))
        .map_err(|e| PatchError::PatchApplicationFailed {
            original: original.to_path_buf(),
            patch: patch_file.to_path_buf(),
            error: e.to_string(),
        })
}

//! Idempotent source-tree mutations
//!
//! Two kinds of mutation are supported: whole-file replacements ("fixes")
//! and unified-diff patches. Neither records state anywhere; whether a
//! mutation is applied is read back from filesystem markers:
//!
//! - a replacement is applied when its destination file exists
//! - a patch is applied when the `.orig` backup left by the patch tool exists
//!
//! "Already applied" and "already absent" are successful outcomes, so
//! applying twice equals applying once and removing a mutation that was
//! never applied is a no-op.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::StepError;
use crate::infra::git::GitWorktree;
use crate::infra::patch_tool;
use crate::infra::process::ProcessRunner;

/// Whether a mutation is currently in effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    Applied,
    NotApplied,
}

/// What an apply or unapply call actually did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The mutation was performed
    Applied,
    /// A marker showed the mutation in effect; nothing was done
    AlreadyApplied,
    /// The mutation was reverted
    Removed,
    /// There was nothing to revert
    AlreadyAbsent,
}

/// Read-only view of the filesystem markers
pub trait MarkerProbe {
    /// Whether something exists at `path`
    fn exists(&self, path: &Path) -> bool;
}

/// Probe backed by the real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskProbe;

impl MarkerProbe for DiskProbe {
    fn exists(&self, path: &Path) -> bool {
        path.symlink_metadata().is_ok()
    }
}

/// A whole-file substitution into the source tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReplacement {
    /// File copied in
    pub replacement: PathBuf,
    /// Location inside the source tree
    pub destination: PathBuf,
}

/// A unified diff applied to one source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffPatch {
    /// File being patched
    pub original: PathBuf,
    /// Diff to apply
    pub patch: PathBuf,
}

impl DiffPatch {
    /// Backup the patch tool leaves next to the original
    pub fn backup(&self) -> PathBuf {
        patch_tool::backup_path(&self.original)
    }
}

/// State of a file replacement
pub fn replacement_state(probe: &dyn MarkerProbe, destination: &Path) -> MutationState {
    if probe.exists(destination) {
        MutationState::Applied
    } else {
        MutationState::NotApplied
    }
}

/// State of a diff patch
pub fn patch_state(probe: &dyn MarkerProbe, patch: &DiffPatch) -> MutationState {
    if probe.exists(&patch.backup()) {
        MutationState::Applied
    } else {
        MutationState::NotApplied
    }
}

/// Applies and reverts mutations for one component
pub struct Guard<'a> {
    component: &'a str,
    runner: &'a ProcessRunner,
    worktree: GitWorktree,
    probe: &'a dyn MarkerProbe,
}

impl<'a> Guard<'a> {
    /// Create a guard for `component` whose checkout lives at `sources_dir`
    pub fn new(
        component: &'a str,
        sources_dir: &Path,
        runner: &'a ProcessRunner,
        probe: &'a dyn MarkerProbe,
    ) -> Self {
        Self {
            component,
            runner,
            worktree: GitWorktree::new(sources_dir),
            probe,
        }
    }

    /// Copy the replacement in unless the destination already exists
    pub fn apply_replacement(&self, fix: &FileReplacement) -> Result<MutationOutcome, StepError> {
        match replacement_state(self.probe, &fix.destination) {
            MutationState::Applied => {
                info!(
                    component = self.component,
                    destination = %fix.destination.display(),
                    "file exists, fix already applied, skipping"
                );
                Ok(MutationOutcome::AlreadyApplied)
            }
            MutationState::NotApplied => {
                info!(
                    component = self.component,
                    destination = %fix.destination.display(),
                    "applying fix"
                );
                self.runner.copy_file(&fix.replacement, &fix.destination)?;
                Ok(MutationOutcome::Applied)
            }
        }
    }

    /// Delete a previously copied replacement
    pub fn unapply_replacement(&self, destination: &Path) -> Result<MutationOutcome, StepError> {
        match replacement_state(self.probe, destination) {
            MutationState::Applied => {
                info!(
                    component = self.component,
                    destination = %destination.display(),
                    "removing previously applied fix"
                );
                self.runner.remove_file(destination)?;
                Ok(MutationOutcome::Removed)
            }
            MutationState::NotApplied => Ok(MutationOutcome::AlreadyAbsent),
        }
    }

    /// Apply a diff unless its backup marker exists
    ///
    /// A patch the tool rejects is fatal. The original is restored from the
    /// backup and the backup and reject files are removed, so a rejected
    /// patch never reads as applied.
    pub fn apply_patch(&self, patch: &DiffPatch) -> Result<MutationOutcome, StepError> {
        match patch_state(self.probe, patch) {
            MutationState::Applied => {
                info!(
                    component = self.component,
                    backup = %patch.backup().display(),
                    "backup exists, already patched, skipping"
                );
                Ok(MutationOutcome::AlreadyApplied)
            }
            MutationState::NotApplied => {
                info!(
                    component = self.component,
                    file = %patch.original.display(),
                    patch = %patch.patch.display(),
                    "patching"
                );
                if let Err(err) = patch_tool::apply(self.runner, &patch.original, &patch.patch) {
                    if let Err(cleanup) = self.discard_rejected(patch) {
                        warn!(
                            component = self.component,
                            file = %patch.original.display(),
                            error = %cleanup,
                            "failed to clean up after rejected patch"
                        );
                    }
                    return Err(err.into());
                }
                Ok(MutationOutcome::Applied)
            }
        }
    }

    /// Undo what a failed patch run left behind
    fn discard_rejected(&self, patch: &DiffPatch) -> Result<(), StepError> {
        let backup = patch.backup();
        if self.probe.exists(&backup) {
            self.runner.copy_file(&backup, &patch.original)?;
            self.runner.remove_file(&backup)?;
        }
        self.runner
            .remove_file(&patch_tool::reject_path(&patch.original))?;
        Ok(())
    }

    /// Restore the original from source control and drop the backup
    ///
    /// The checkout runs even without a backup, so a file left half-patched
    /// by an interrupted run is restored too.
    pub fn unapply_patch(&self, patch: &DiffPatch) -> Result<MutationOutcome, StepError> {
        info!(
            component = self.component,
            file = %patch.original.display(),
            "removing previously applied patch"
        );
        self.worktree.checkout_file(self.runner, &patch.original)?;

        let backup = patch.backup();
        match patch_state(self.probe, patch) {
            MutationState::Applied => {
                self.runner.remove_file(&backup)?;
                Ok(MutationOutcome::Removed)
            }
            MutationState::NotApplied => Ok(MutationOutcome::AlreadyAbsent),
        }
    }

    /// Apply or remove a replacement
    pub fn configure_replacement(
        &self,
        fix: &FileReplacement,
        enable: bool,
    ) -> Result<MutationOutcome, StepError> {
        if enable {
            self.apply_replacement(fix)
        } else {
            self.unapply_replacement(&fix.destination)
        }
    }

    /// Apply or remove a patch
    pub fn configure_patch(
        &self,
        patch: &DiffPatch,
        enable: bool,
    ) -> Result<MutationOutcome, StepError> {
        if enable {
            self.apply_patch(patch)
        } else {
            self.unapply_patch(patch)
        }
    }
}

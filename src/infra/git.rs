//! Source-control operations
//!
//! Restores individual files and scrubs untracked files in a component's
//! source checkout by invoking `git` through the [`ProcessRunner`].

use std::path::{Path, PathBuf};

use crate::error::{PatchError, ProcessError};
use crate::infra::process::{CommandLine, ProcessRunner};

/// Git working tree rooted at a component's sources directory
#[derive(Debug, Clone)]
pub struct GitWorktree {
    /// Repository root; every command runs from here
    root: PathBuf,
}

impl GitWorktree {
    /// Create a handle for the working tree at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Discard local modifications to a single file
    pub fn checkout_file(&self, runner: &ProcessRunner, file: &Path) -> Result<(), PatchError> {
        let cmd = CommandLine::new("git")
            .args(["checkout", "--"])
            .arg(file)
            .current_dir(&self.root);

        runner.run(&cmd).map_err(|e| PatchError::RestoreFailed {
            original: file.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Remove every untracked and ignored file
    ///
    /// The first pass removes untracked files and directories including
    /// ignored ones; the second catches ignored files a nested ignore rule
    /// shielded from the first.
    pub fn clean_untracked(&self, runner: &ProcessRunner) -> Result<(), ProcessError> {
        runner.run(
            &CommandLine::new("git")
                .args(["clean", "--quiet", "-f", "-x", "-d"])
                .current_dir(&self.root),
        )?;
        runner.run(
            &CommandLine::new("git")
                .args(["clean", "--quiet", "-f", "-X"])
                .current_dir(&self.root),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::git_repo_with;
    use tempfile::TempDir;

    #[test]
    fn test_checkout_restores_modified_file() {
        let dir = TempDir::new().unwrap();
        if !git_repo_with(dir.path(), &[("foo.c", "OLD\n")]) {
            return;
        }
        let file = dir.path().join("foo.c");
        std::fs::write(&file, "NEW\n").unwrap();

        let tree = GitWorktree::new(dir.path());
        tree.checkout_file(&ProcessRunner::new(false), &file).unwrap();

        assert_eq!(std::fs::read_to_string(&file).unwrap(), "OLD\n");
    }

    #[test]
    fn test_checkout_untracked_file_is_restore_failure() {
        let dir = TempDir::new().unwrap();
        if !git_repo_with(dir.path(), &[("foo.c", "OLD\n")]) {
            return;
        }
        let tree = GitWorktree::new(dir.path());
        let err = tree
            .checkout_file(&ProcessRunner::new(false), &dir.path().join("missing.c"))
            .unwrap_err();
        assert!(matches!(err, PatchError::RestoreFailed { .. }));
    }

    #[test]
    fn test_clean_removes_untracked_and_ignored() {
        let dir = TempDir::new().unwrap();
        if !git_repo_with(dir.path(), &[("foo.c", "x\n"), (".gitignore", "*.o\n")]) {
            return;
        }
        std::fs::write(dir.path().join("foo.o"), "obj").unwrap();
        std::fs::create_dir_all(dir.path().join("gen/sub")).unwrap();
        std::fs::write(dir.path().join("gen/sub/config.h"), "#define X").unwrap();

        let tree = GitWorktree::new(dir.path());
        tree.clean_untracked(&ProcessRunner::new(false)).unwrap();

        assert!(!dir.path().join("foo.o").exists());
        assert!(!dir.path().join("gen").exists());
        assert!(dir.path().join("foo.c").exists());
    }

    #[test]
    fn test_dry_run_leaves_tree_untouched() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("scratch"), "x").unwrap();

        let tree = GitWorktree::new(dir.path());
        tree.clean_untracked(&ProcessRunner::new(true)).unwrap();

        assert!(dir.path().join("scratch").exists());
    }
}

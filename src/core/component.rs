//! Component capability interface
//!
//! A [`Component`] supplies the work done inside each lifecycle phase. The
//! [`crate::core::lifecycle::Builder`] owns the sequencing and hands every
//! hook a [`BuildContext`] with the component's paths, target and helpers
//! for idempotent source mutations.

use std::path::{Component as PathComponent, Path, PathBuf};

use tracing::info;

use crate::config::defaults::PATCH_EXTENSION;
use crate::core::guard::{DiffPatch, FileReplacement, Guard, MarkerProbe, MutationOutcome};
use crate::core::paths::{BuildPaths, Target};
use crate::error::StepError;
use crate::infra::process::{CommandLine, ProcessRunner};

/// Per-component behaviour plugged into the lifecycle
///
/// Every hook defaults to doing nothing.
pub trait Component {
    /// Component name; selects the source, patch, build and install directories
    fn name(&self) -> &str;

    /// Prepare the build directory, e.g. run a configure script
    fn configure(&self, _ctx: &BuildContext<'_>) -> Result<(), StepError> {
        Ok(())
    }

    /// Compile
    fn build(&self, _ctx: &BuildContext<'_>) -> Result<(), StepError> {
        Ok(())
    }

    /// Populate the install directory
    fn install(&self, _ctx: &BuildContext<'_>) -> Result<(), StepError> {
        Ok(())
    }

    /// Apply (`enable`) or revert every patch and fix of the component
    ///
    /// Both directions must be safe to repeat.
    fn configure_patches(&self, _ctx: &BuildContext<'_>, _enable: bool) -> Result<(), StepError> {
        Ok(())
    }
}

/// Component with no hooks of its own
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedComponent(pub String);

impl Component for NamedComponent {
    fn name(&self) -> &str {
        &self.0
    }
}

/// Everything a hook may use while one phase runs
pub struct BuildContext<'a> {
    pub(crate) component: &'a str,
    pub(crate) target: &'a Target,
    pub(crate) paths: &'a BuildPaths,
    pub(crate) runner: &'a ProcessRunner,
    pub(crate) probe: &'a dyn MarkerProbe,
    pub(crate) jobs: usize,
}

impl<'a> BuildContext<'a> {
    /// Component name
    pub fn component(&self) -> &str {
        self.component
    }

    /// Target being built
    pub fn target(&self) -> &Target {
        self.target
    }

    /// Working directories
    pub fn paths(&self) -> &BuildPaths {
        self.paths
    }

    /// Parallel job count for build tools
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Runner shared with the lifecycle
    pub fn runner(&self) -> &ProcessRunner {
        self.runner
    }

    /// Run a command to completion
    pub fn run(&self, cmd: &CommandLine) -> Result<(), StepError> {
        self.runner.run(cmd).map_err(StepError::from)
    }

    /// Idempotency guard scoped to this component's sources
    pub fn guard(&self) -> Guard<'_> {
        Guard::new(self.component, self.paths.sources_dir(), self.runner, self.probe)
    }

    /// Copy `replacement` to `destination` (`enable`) or delete `destination`
    pub fn add_file(
        &self,
        replacement: &Path,
        destination: &Path,
        enable: bool,
    ) -> Result<MutationOutcome, StepError> {
        let fix = FileReplacement {
            replacement: replacement.to_path_buf(),
            destination: destination.to_path_buf(),
        };
        self.guard().configure_replacement(&fix, enable)
    }

    /// Apply `patch` to `original` (`enable`) or restore `original`
    pub fn configure_patch(
        &self,
        original: &Path,
        patch: &Path,
        enable: bool,
    ) -> Result<MutationOutcome, StepError> {
        let patch = DiffPatch {
            original: original.to_path_buf(),
            patch: patch.to_path_buf(),
        };
        self.guard().configure_patch(&patch, enable)
    }

    /// Apply or restore the source file a diff under the patches directory targets
    pub fn configure_patch_file(
        &self,
        patch_file: &Path,
        enable: bool,
    ) -> Result<MutationOutcome, StepError> {
        let original = original_for_patch(self.paths, patch_file);
        self.configure_patch(&original, patch_file, enable)
    }

    /// Point `to` at `from`, replacing whatever is at `to`
    ///
    /// With `relative`, the link target is expressed relative to `to`'s
    /// directory so the install tree stays relocatable.
    pub fn setup_symlink(&self, from: &Path, to: &Path, relative: bool) -> Result<(), StepError> {
        if self.probe.exists(to) {
            self.runner.remove_file(to)?;
        }
        let parent = to.parent().unwrap_or_else(|| Path::new("."));
        self.runner.create_dir_all(parent)?;

        let target = if relative {
            relative_to(from, parent)
        } else {
            from.to_path_buf()
        };
        info!(
            component = self.component,
            link = %to.display(),
            target = %target.display(),
            "linking"
        );
        self.runner.symlink(&target, to)?;
        Ok(())
    }
}

/// Source file a diff applies to
///
/// The diff's path below the patches directory is re-rooted under the
/// sources directory and the `.diff` suffix dropped:
/// `<patches>/src/foo.c.diff` targets `<sources>/src/foo.c`.
pub fn original_for_patch(paths: &BuildPaths, patch_file: &Path) -> PathBuf {
    let relative = patch_file
        .strip_prefix(paths.patches_dir())
        .unwrap_or(patch_file);
    let mut original = paths.sources_dir().join(relative);
    if let Some(name) = original.file_name().map(|n| n.to_string_lossy().into_owned()) {
        if let Some(stripped) = name.strip_suffix(PATCH_EXTENSION) {
            original.set_file_name(stripped);
        }
    }
    original
}

/// Express `path` relative to the directory `base`
///
/// Both paths are compared lexically; they are expected to be absolute.
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let path_parts: Vec<PathComponent<'_>> = path.components().collect();
    let base_parts: Vec<PathComponent<'_>> = base.components().collect();

    let common = path_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_parts.len() {
        relative.push("..");
    }
    for part in &path_parts[common..] {
        relative.push(part.as_os_str());
    }
    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    relative
}

//! Component lifecycle
//!
//! [`Builder`] drives one component through `configure → build → install`
//! for one target, framing each phase with start and completion markers.
//! The component's own work comes from its [`Component`] hooks.
//!
//! Any hook or patch failure aborts the running phase. Nothing is retried
//! or rolled back: a failed install leaves the install directory deleted.

use std::fmt;

use tracing::info;

use crate::config::defaults::{END_SPACER, RESERVED_CPUS, START_SPACER};
use crate::core::component::{BuildContext, Component};
use crate::core::guard::{DiskProbe, MarkerProbe};
use crate::core::paths::{BuildPaths, RootDirs, Target};
use crate::error::{BuildError, StepError};
use crate::infra::git::GitWorktree;
use crate::infra::process::ProcessRunner;

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Configure,
    Build,
    Install,
    Clean,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Configure => "Configure",
            Self::Build => "Build",
            Self::Install => "Install",
            Self::Clean => "Clean",
        })
    }
}

/// Where the builder is in its lifecycle
///
/// A failed phase leaves the builder in that phase's in-progress state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Configuring,
    Configured,
    Building,
    Built,
    Installing,
    Installed,
    Cleaning,
}

/// Start or end of a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Started,
    Completed,
}

/// One entry of the in-memory phase journal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseEvent {
    pub phase: Phase,
    pub marker: Marker,
}

/// Parallel jobs for build tools: physical CPUs minus a reserve, at least one
pub fn default_jobs() -> usize {
    num_cpus::get_physical()
        .saturating_sub(RESERVED_CPUS)
        .max(1)
}

/// Lifecycle driver for one component and one target
pub struct Builder {
    component: Box<dyn Component>,
    target: Target,
    paths: BuildPaths,
    runner: ProcessRunner,
    probe: Box<dyn MarkerProbe>,
    jobs: usize,
    state: LifecycleState,
    journal: Vec<PhaseEvent>,
}

impl Builder {
    /// Create a builder; the working directories are fixed here
    pub fn new(
        component: Box<dyn Component>,
        target: Target,
        roots: &RootDirs,
        runner: ProcessRunner,
    ) -> Self {
        let paths = BuildPaths::derive(roots, component.name(), &target);
        Self {
            component,
            target,
            paths,
            runner,
            probe: Box::new(DiskProbe),
            jobs: default_jobs(),
            state: LifecycleState::Idle,
            journal: Vec::new(),
        }
    }

    /// Override the parallel job count
    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Replace the filesystem probe used to detect applied mutations
    #[must_use]
    pub fn with_probe(mut self, probe: Box<dyn MarkerProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Component name
    pub fn name(&self) -> &str {
        self.component.name()
    }

    /// Target being built
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Working directories
    pub fn paths(&self) -> &BuildPaths {
        &self.paths
    }

    /// Parallel job count
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Current lifecycle state
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Phase markers emitted so far
    pub fn journal(&self) -> &[PhaseEvent] {
        &self.journal
    }

    /// Create the build directory, reset and reapply patches, run the configure hook
    pub fn configure(&mut self) -> Result<(), BuildError> {
        self.phase(
            Phase::Configure,
            LifecycleState::Configuring,
            LifecycleState::Configured,
            |builder| {
                builder.prepare()?;
                let ctx = builder.context();
                builder.component.configure_patches(&ctx, false)?;
                builder.component.configure_patches(&ctx, true)?;
                builder.component.configure(&ctx)
            },
        )
    }

    /// Create the build directory and run the build hook
    pub fn build(&mut self) -> Result<(), BuildError> {
        self.phase(
            Phase::Build,
            LifecycleState::Building,
            LifecycleState::Built,
            |builder| {
                builder.prepare()?;
                builder.component.build(&builder.context())
            },
        )
    }

    /// Empty the install directory and run the install hook
    pub fn install(&mut self) -> Result<(), BuildError> {
        self.phase(
            Phase::Install,
            LifecycleState::Installing,
            LifecycleState::Installed,
            |builder| {
                builder.runner.remove_dir_all(builder.paths.installs_dir())?;
                builder.component.install(&builder.context())
            },
        )
    }

    /// Configure, build and install, then leave the sources unpatched
    pub fn make(&mut self) -> Result<(), BuildError> {
        self.configure()?;
        self.build()?;
        self.install()?;
        self.configure_patches(false)
    }

    /// Revert patches, delete the build directory and scrub the source checkout
    pub fn clean(&mut self) -> Result<(), BuildError> {
        self.phase(
            Phase::Clean,
            LifecycleState::Cleaning,
            LifecycleState::Idle,
            |builder| {
                builder
                    .component
                    .configure_patches(&builder.context(), false)?;
                builder.runner.remove_dir_all(builder.paths.builds_dir())?;
                GitWorktree::new(builder.paths.sources_dir()).clean_untracked(&builder.runner)?;
                Ok(())
            },
        )
    }

    /// Apply or revert the component's patch set outside of a phase
    pub fn configure_patches(&self, enable: bool) -> Result<(), BuildError> {
        self.component
            .configure_patches(&self.context(), enable)
            .map_err(|source| BuildError::Patches {
                component: self.component.name().to_string(),
                source,
            })
    }

    fn prepare(&self) -> Result<(), StepError> {
        self.runner.create_dir_all(self.paths.builds_dir())?;
        Ok(())
    }

    fn context(&self) -> BuildContext<'_> {
        BuildContext {
            component: self.component.name(),
            target: &self.target,
            paths: &self.paths,
            runner: &self.runner,
            probe: self.probe.as_ref(),
            jobs: self.jobs,
        }
    }

    fn phase<F>(
        &mut self,
        phase: Phase,
        running: LifecycleState,
        done: LifecycleState,
        work: F,
    ) -> Result<(), BuildError>
    where
        F: FnOnce(&Self) -> Result<(), StepError>,
    {
        self.state = running;
        self.log_started(phase);

        work(self).map_err(|source| BuildError::Phase {
            component: self.component.name().to_string(),
            phase,
            source,
        })?;

        self.log_completed(phase);
        self.state = done;
        Ok(())
    }

    fn log_started(&mut self, phase: Phase) {
        let component = self.component.name();
        info!(component, arch = %self.target, "{START_SPACER}");
        info!(component, arch = %self.target, "\"{component}\" {phase} is started.");
        self.journal.push(PhaseEvent {
            phase,
            marker: Marker::Started,
        });
    }

    fn log_completed(&mut self, phase: Phase) {
        let component = self.component.name();
        info!(component, arch = %self.target, "\"{component}\" {phase} is completed.");
        info!(component, arch = %self.target, "{END_SPACER}");
        self.journal.push(PhaseEvent {
            phase,
            marker: Marker::Completed,
        });
    }
}

//! Error types for cforge
//!
//! Domain-specific error types using thiserror.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::lifecycle::Phase;

/// External process errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    /// Process exited with a non-zero status
    #[error("Command `{command}` failed with {}", ExitCode(*status))]
    CommandFailed {
        command: String,
        status: Option<i32>,
    },

    /// Process could not be started
    #[error("Failed to run `{command}`: {error}")]
    SpawnFailed { command: String, error: String },
}

/// Renders an exit code, or the lack of one when a signal killed the process
struct ExitCode(Option<i32>);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(code) => write!(f, "exit status {code}"),
            None => write!(f, "no exit status (terminated by signal)"),
        }
    }
}

/// Filesystem errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove directory '{path}': {error}")]
    RemoveDir { path: PathBuf, error: String },

    /// Failed to copy file
    #[error("Failed to copy '{from}' to '{to}': {error}")]
    CopyFile {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },

    /// Failed to remove file
    #[error("Failed to remove file '{path}': {error}")]
    RemoveFile { path: PathBuf, error: String },

    /// Failed to create symbolic link
    #[error("Failed to link '{link}' -> '{target}': {error}")]
    Symlink {
        link: PathBuf,
        target: PathBuf,
        error: String,
    },
}

/// Source patching errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    /// The patch tool rejected the diff
    #[error("Failed to apply patch '{patch}' to '{original}': {error}")]
    PatchApplicationFailed {
        original: PathBuf,
        patch: PathBuf,
        error: String,
    },

    /// Source control could not restore the pristine file
    #[error("Failed to restore '{original}' from source control: {error}")]
    RestoreFailed { original: PathBuf, error: String },
}

/// Failure of a single step inside a lifecycle phase
#[derive(Error, Debug)]
pub enum StepError {
    /// External command failed
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// Filesystem mutation failed
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    /// Patch could not be applied or reverted
    #[error(transparent)]
    Patch(#[from] PatchError),

    /// Recipe or component misconfiguration detected while running a hook
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Component-specific failure
    #[error("{0}")]
    Hook(String),
}

/// Lifecycle errors
#[derive(Error, Debug)]
pub enum BuildError {
    /// A phase aborted
    #[error("\"{component}\" {phase} failed: {source}")]
    Phase {
        component: String,
        phase: Phase,
        source: StepError,
    },

    /// Applying or reverting the patch set outside a phase failed
    #[error("\"{component}\" patch configuration failed: {source}")]
    Patches { component: String, source: StepError },
}

impl BuildError {
    /// The phase that aborted, if the failure happened inside one
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::Phase { phase, .. } => Some(*phase),
            Self::Patches { .. } => None,
        }
    }
}

/// Project configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Config file missing
    #[error("Config not found at '{path}'. Create a cforge.toml or pass --config.")]
    NotFound { path: PathBuf },

    /// Config file unreadable
    #[error("Failed to read config '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Config file is not valid TOML or has the wrong shape
    #[error("Failed to parse config '{path}': {error}")]
    Parse { path: PathBuf, error: String },

    /// Component not declared
    #[error("Component '{name}' is not defined in the config")]
    UnknownComponent { name: String },

    /// Architecture not declared
    #[error("Architecture '{arch}' is not configured (known: {})", known.join(", "))]
    UnknownArchitecture { arch: String, known: Vec<String> },

    /// Placeholder in a recipe step is not recognised
    #[error("Unknown placeholder '{{{placeholder}}}' in component '{component}'")]
    UnknownPlaceholder {
        component: String,
        placeholder: String,
    },

    /// A recipe step has no program
    #[error("Component '{component}' has an empty {phase} step")]
    EmptyCommand { component: String, phase: String },
}

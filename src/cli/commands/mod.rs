//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod doctor;
pub mod lifecycle;
pub mod list;
pub mod paths;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cli::Session;
use lifecycle::Operation;

/// Components, architectures and parallelism for a lifecycle command
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Components to process, in order
    #[arg(required = true, value_name = "COMPONENT")]
    pub components: Vec<String>,

    /// Architecture to build for (repeatable; defaults to every configured one)
    #[arg(short, long = "arch", value_name = "ARCH")]
    pub arch: Vec<String>,

    /// Number of parallel jobs handed to build tools
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Configure, build and install, then revert patches
    Make(TargetArgs),

    /// Reset patches, reapply them and run the configure steps
    Configure(TargetArgs),

    /// Run the build steps
    Build(TargetArgs),

    /// Recreate the install directory and run the install steps
    Install(TargetArgs),

    /// Revert patches, delete the build directory and scrub the sources
    Clean(TargetArgs),

    /// Apply or revert the patch set without building
    Patch {
        #[command(flatten)]
        target: TargetArgs,

        /// Apply patches and fixes
        #[arg(long, conflicts_with = "disable", required_unless_present = "disable")]
        enable: bool,

        /// Revert patches and fixes
        #[arg(long)]
        disable: bool,
    },

    /// Show the working directories of a component
    Paths {
        /// Component name
        component: String,

        /// Architecture [default: first configured]
        #[arg(short, long)]
        arch: Option<String>,
    },

    /// List configured components and architectures
    List,

    /// Check system dependencies and project layout
    Doctor,
}

impl Commands {
    /// Execute the command
    pub fn run(self, session: &Session) -> Result<()> {
        match self {
            Self::Make(args) => lifecycle::execute(session, &args, Operation::Make),
            Self::Configure(args) => lifecycle::execute(session, &args, Operation::Configure),
            Self::Build(args) => lifecycle::execute(session, &args, Operation::Build),
            Self::Install(args) => lifecycle::execute(session, &args, Operation::Install),
            Self::Clean(args) => lifecycle::execute(session, &args, Operation::Clean),
            Self::Patch { target, enable, .. } => {
                lifecycle::execute(session, &target, Operation::Patch { enable })
            }
            Self::Paths { component, arch } => paths::execute(session, &component, arch.as_deref()),
            Self::List => list::execute(session),
            Self::Doctor => doctor::execute(session),
        }
    }
}

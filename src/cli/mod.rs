//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser};

use crate::config::defaults::{CONFIG_FILE_NAME, ENV_DRY_RUN};
use crate::core::project::Project;
use crate::infra::process::ProcessRunner;
use commands::Commands;

/// cforge - per-component build orchestration
///
/// Configures, builds and installs source components for one or more
/// architectures, keeping source patches idempotent.
#[derive(Parser, Debug)]
#[command(name = "cforge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Log every command and file change without performing it
    ///
    /// The environment variable enables it for any value except an empty
    /// one or `0`, `no`, `n`, `false`, `f` and `off`.
    #[arg(
        long,
        global = true,
        env = ENV_DRY_RUN,
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub dry_run: bool,

    /// Project config file [default: ./cforge.toml]
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Variant suffix appended to the architecture, overriding the config
    #[arg(long, global = true, value_name = "SUFFIX")]
    pub variant: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options shared by every command
#[derive(Debug, Clone)]
pub struct Session {
    pub config_path: PathBuf,
    pub dry_run: bool,
    pub variant: Option<String>,
}

impl Session {
    /// Load the project named by `--config`
    pub fn project(&self) -> Result<Project> {
        Project::load(&self.config_path)
            .with_context(|| format!("Failed to load project from {}", self.config_path.display()))
    }

    /// Runner honouring `--dry-run`
    pub fn runner(&self) -> ProcessRunner {
        ProcessRunner::new(self.dry_run)
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let config_path = match self.config {
            Some(path) => path,
            None => std::env::current_dir()?.join(CONFIG_FILE_NAME),
        };
        let session = Session {
            config_path,
            dry_run: self.dry_run,
            variant: self.variant,
        };

        if let Some(cmd) = self.command {
            cmd.run(&session)
        } else {
            // No subcommand provided, show help
            use clap::CommandFactory;
            let mut cmd = Self::command();
            cmd.print_help()?;
            Ok(())
        }
    }
}

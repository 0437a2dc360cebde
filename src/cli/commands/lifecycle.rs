//! CLI for the lifecycle commands
//!
//! `make`, `configure`, `build`, `install`, `clean` and `patch` all run one
//! lifecycle operation over every requested component, one architecture at
//! a time. The first failure stops the run.

use std::fmt;

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::commands::TargetArgs;
use crate::cli::output::{is_json, print_info, print_success};
use crate::cli::Session;
use crate::core::lifecycle::Builder;

/// Lifecycle operation selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Make,
    Configure,
    Build,
    Install,
    Clean,
    Patch { enable: bool },
}

impl Operation {
    fn apply(self, builder: &mut Builder) -> Result<(), crate::error::BuildError> {
        match self {
            Self::Make => builder.make(),
            Self::Configure => builder.configure(),
            Self::Build => builder.build(),
            Self::Install => builder.install(),
            Self::Clean => builder.clean(),
            Self::Patch { enable } => builder.configure_patches(enable),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Make => "make",
            Self::Configure => "configure",
            Self::Build => "build",
            Self::Install => "install",
            Self::Clean => "clean",
            Self::Patch { enable: true } => "patch --enable",
            Self::Patch { enable: false } => "patch --disable",
        })
    }
}

/// Execute a lifecycle command
pub fn execute(session: &Session, args: &TargetArgs, operation: Operation) -> Result<()> {
    let project = session.project()?;
    let architectures = project.select_architectures(&args.arch)?;
    // resolve every component before touching anything
    for name in &args.components {
        project.component(name)?;
    }

    if session.dry_run {
        print_info("Dry run: commands and file changes are logged, not performed");
    }

    let mut completed = Vec::new();
    for arch in &architectures {
        let target = project.target_for(arch, session.variant.as_deref());
        for name in &args.components {
            let mut builder = project.builder(name, target.clone(), session.runner())?;
            if let Some(jobs) = args.jobs {
                builder = builder.with_jobs(jobs);
            }

            info!(component = %name, arch = %target, %operation, "starting");
            operation
                .apply(&mut builder)
                .with_context(|| format!("{operation} failed for '{name}' ({target})"))?;

            print_success(&format!("{name} ({target}): {operation} done"));
            completed.push(serde_json::json!({
                "component": name,
                "target": target.qualifier(),
                "installs": builder.paths().installs_dir(),
            }));
        }
    }

    if is_json() {
        let json = serde_json::json!({
            "status": "success",
            "operation": operation.to_string(),
            "dry_run": session.dry_run,
            "completed": completed,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
    }

    Ok(())
}

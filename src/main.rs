//! cforge CLI
//!
//! Entry point for the cforge command-line application.

use std::io::IsTerminal;

use clap::Parser;

use cforge::cli::output::{display_error, OutputConfig};
use cforge::cli::Cli;

fn main() {
    let cli = Cli::parse();

    // Apply output configuration globally
    let output_config = OutputConfig::new(cli.quiet, cli.json, cli.verbose);
    output_config.apply_global();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(output_config.log_level().into()),
        )
        .init();

    // Run the command and handle errors
    if let Err(e) = cli.run() {
        display_error(&e);
        std::process::exit(1);
    }
}

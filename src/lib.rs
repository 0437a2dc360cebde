//! cforge - per-component build orchestration
//!
//! Drives source components through configure, build and install for one
//! or more target architectures, applying and reverting source patches
//! idempotently.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Path derivation, patch guard, lifecycle and project config
//! - [`infra`] - Infrastructure layer (processes, filesystem, git, patch)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;

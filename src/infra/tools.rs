//! External tool discovery

use std::path::PathBuf;

/// Tools the lifecycle shells out to
pub const REQUIRED_TOOLS: &[&str] = &["git", "patch"];

/// Locate a program on `PATH`
pub fn locate(tool: &str) -> Option<PathBuf> {
    which::which(tool).ok()
}

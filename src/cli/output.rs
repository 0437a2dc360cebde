//! Output formatting
//!
//! Global output mode (quiet or JSON) plus helpers for printing
//! status lines and errors to the user. Phase progress goes through
//! `tracing`; these helpers are for command results.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::Level;

static QUIET: AtomicBool = AtomicBool::new(false);
static JSON: AtomicBool = AtomicBool::new(false);

/// Output mode selected on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputConfig {
    pub quiet: bool,
    pub json: bool,
    pub verbose: u8,
}

impl OutputConfig {
    pub fn new(quiet: bool, json: bool, verbose: u8) -> Self {
        Self {
            quiet,
            json,
            verbose,
        }
    }

    /// Make this mode visible to [`is_quiet`] and [`is_json`]
    pub fn apply_global(self) {
        QUIET.store(self.quiet, Ordering::Relaxed);
        JSON.store(self.json, Ordering::Relaxed);
    }

    /// Log level: `info` by default, `-v` debug, `-vv` trace, `-q` or `--json` warn
    pub fn log_level(self) -> Level {
        if self.quiet || self.json {
            return Level::WARN;
        }
        match self.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

pub fn is_json() -> bool {
    JSON.load(Ordering::Relaxed)
}

/// Print an informational line unless quiet
pub fn print_info(message: &str) {
    if !is_quiet() && !is_json() {
        println!("{} {message}", status::INFO);
    }
}

/// Print a success line unless quiet
pub fn print_success(message: &str) {
    if !is_quiet() && !is_json() {
        println!("{} {message}", status::SUCCESS);
    }
}

/// Print a warning line; warnings survive `--quiet`
pub fn print_warning(message: &str) {
    if !is_json() {
        eprintln!("{} {message}", status::WARNING);
    }
}

/// Print an indented detail line unless quiet
pub fn print_detail(message: &str) {
    if !is_quiet() && !is_json() {
        println!("    {message}");
    }
}

/// Print an error and its causes to stderr
pub fn display_error(error: &anyhow::Error) {
    if is_json() {
        let causes: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
        let json = serde_json::json!({
            "status": "error",
            "error": error.to_string(),
            "causes": causes,
        });
        eprintln!("{json}");
        return;
    }

    eprintln!("{} Error: {error}", status::ERROR);
    for cause in error.chain().skip(1) {
        eprintln!("    Caused by: {cause}");
    }
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_flags() {
        assert_eq!(OutputConfig::new(false, false, 0).log_level(), Level::INFO);
        assert_eq!(OutputConfig::new(false, false, 1).log_level(), Level::DEBUG);
        assert_eq!(OutputConfig::new(false, false, 3).log_level(), Level::TRACE);
        assert_eq!(OutputConfig::new(true, false, 2).log_level(), Level::WARN);
        assert_eq!(OutputConfig::new(false, true, 0).log_level(), Level::WARN);
    }
}

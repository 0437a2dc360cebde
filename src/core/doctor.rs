//! Doctor command logic
//!
//! Checks the external tools the lifecycle shells out to and the project's
//! root directories, reporting issues with suggestions.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::core::project::Project;
use crate::infra::process::{CommandLine, ProcessRunner};
use crate::infra::tools::{self, REQUIRED_TOOLS};

/// Build tools recipes commonly call; missing ones only warn
const OPTIONAL_TOOLS: &[&str] = &["make", "cmake"];

/// Result of a single dependency check
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    /// Name of the dependency being checked
    pub name: String,
    /// Whether the check passed
    pub passed: bool,
    /// Version if available
    pub version: Option<String>,
    /// Error message if check failed
    pub error: Option<String>,
    /// Suggestion for fixing the issue
    pub suggestion: Option<String>,
    /// Whether this is a required or optional dependency
    pub required: bool,
}

impl CheckResult {
    /// Create a passing check result
    pub fn pass(name: &str, version: Option<String>, required: bool) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            version,
            error: None,
            suggestion: None,
            required,
        }
    }

    /// Create a failing check result
    pub fn fail(name: &str, error: &str, suggestion: Option<&str>, required: bool) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            version: None,
            error: Some(error.to_string()),
            suggestion: suggestion.map(String::from),
            required,
        }
    }
}

/// Overall doctor report
#[derive(Debug, Default)]
pub struct DoctorReport {
    /// Individual check results
    pub checks: Vec<CheckResult>,
    /// Project issues found
    pub config_issues: Vec<String>,
}

impl DoctorReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_check(&mut self, result: CheckResult) {
        self.checks.push(result);
    }

    pub fn add_config_issue(&mut self, issue: String) {
        self.config_issues.push(issue);
    }

    /// Check if all checks passed (including optional)
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed) && self.config_issues.is_empty()
    }

    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    /// `ok`, `warning` when only optional checks or project checks failed, `error` otherwise
    pub fn status(&self) -> &'static str {
        if self.all_passed() {
            "ok"
        } else if self.failed_required().is_empty() {
            "warning"
        } else {
            "error"
        }
    }

    /// Get all failed required checks
    pub fn failed_required(&self) -> Vec<&CheckResult> {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .collect()
    }
}

/// Look up `tool` on `PATH` and ask it for its version
pub fn check_tool(tool: &str, required: bool) -> CheckResult {
    let Some(path) = tools::locate(tool) else {
        let suggestion = format!("Install {tool} with your package manager");
        return CheckResult::fail(
            tool,
            &format!("{tool} not found in PATH"),
            Some(&suggestion),
            required,
        );
    };

    let version = ProcessRunner::new(false)
        .capture(&CommandLine::new(path).arg("--version"))
        .ok()
        .and_then(|output| extract_version(&output));
    CheckResult::pass(tool, version, required)
}

/// Extract version string from command output
fn extract_version(output: &str) -> Option<String> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"v?(\d+\.\d+(?:\.\d+)?(?:-\w+)?)").expect("version pattern is valid")
    });
    pattern
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Issues with the project's directories
pub fn check_project(project: &Project) -> Vec<String> {
    let mut issues = Vec::new();
    let roots = project.roots();

    for (label, dir) in [
        ("Sources", &roots.sources),
        ("Patches", &roots.patches),
        ("Build", &roots.build),
        ("Install", &roots.install),
    ] {
        if !dir.is_dir() {
            issues.push(format!("{label} directory '{}' does not exist", dir.display()));
        }
    }

    if roots.sources.is_dir() {
        for name in project.component_names() {
            let sources = roots.sources.join(name);
            if !sources.is_dir() {
                issues.push(format!(
                    "Component '{name}' has no sources at '{}'",
                    sources.display()
                ));
            }
        }
    }

    issues
}

/// Run all doctor checks
pub fn run_doctor(project: Option<&Project>) -> DoctorReport {
    let mut report = DoctorReport::new();

    for tool in REQUIRED_TOOLS {
        report.add_check(check_tool(tool, true));
    }
    for tool in OPTIONAL_TOOLS {
        report.add_check(check_tool(tool, false));
    }

    if let Some(project) = project {
        for issue in check_project(project) {
            report.add_config_issue(issue);
        }
    }

    report
}

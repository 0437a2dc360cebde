//! CLI command for `cforge doctor`

use anyhow::Result;

use crate::cli::output::{is_json, is_quiet, print_detail, print_success, print_warning, status};
use crate::cli::Session;
use crate::core::doctor::{run_doctor, CheckResult, DoctorReport};
use crate::core::project::Project;

/// Execute the doctor command
///
/// Project checks run only when the config exists; a config that fails to
/// load is reported as a project issue.
pub fn execute(session: &Session) -> Result<()> {
    let loaded = session
        .config_path
        .exists()
        .then(|| Project::load(&session.config_path));
    let project = match &loaded {
        Some(Ok(project)) => Some(project),
        _ => None,
    };

    let mut report = run_doctor(project);
    if let Some(Err(e)) = loaded {
        report.add_config_issue(e.to_string());
    }

    if is_json() {
        let json = serde_json::json!({
            "status": report.status(),
            "checks": report.checks,
            "config_issues": report.config_issues,
            "failed_count": report.failed_count(),
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        print_report(&report);
    }

    if report.failed_required().is_empty() {
        Ok(())
    } else {
        anyhow::bail!("Missing required tools: {}", missing_names(&report))
    }
}

fn print_report(report: &DoctorReport) {
    for check in &report.checks {
        if !(is_quiet() && check.passed) {
            print_check(check);
        }
    }

    for issue in &report.config_issues {
        print_warning(issue);
    }

    match report.status() {
        "ok" => print_success(&format!("{} tools found", report.passed_count())),
        _ => print_warning(&format!(
            "{} of {} tools missing",
            report.failed_count(),
            report.checks.len()
        )),
    }
}

fn print_check(check: &CheckResult) {
    let optional = if check.required { "" } else { " [optional]" };
    if check.passed {
        let version = check.version.as_deref().unwrap_or("unknown version");
        println!("  {} {} ({version}){optional}", status::SUCCESS, check.name);
        return;
    }

    println!("  {} {}{optional}", status::ERROR, check.name);
    if let Some(suggestion) = &check.suggestion {
        print_detail(suggestion);
    }
}

fn missing_names(report: &DoctorReport) -> String {
    report
        .failed_required()
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

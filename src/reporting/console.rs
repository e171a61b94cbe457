//! Coloured terminal output for agent results.

use colored::Colorize;

use super::shared::pluralize;
use crate::agents::{CheckOutcome, CheckStatus, Decision, QualityReport, TaskResult};
use crate::types::AuditReport;

/// Prints the audit summary followed by a one-line verdict.
pub fn print_audit_report(report: &AuditReport) {
    println!("{}", report.summary);
    let files = format!("{} {}", report.total_files, pluralize("file", report.total_files));
    if report.has_critical() {
        println!(
            "{} {} blocking {} in {files}",
            "FAIL".red().bold(),
            report.p0_count,
            pluralize("violation", report.p0_count)
        );
    } else {
        println!(
            "{} no blocking violations in {files} ({} to review)",
            "PASS".green().bold(),
            report.p1_count + report.p2_count
        );
    }
}

/// Prints an agent's findings grouped by weight.
pub fn print_task_result(agent: &str, result: &TaskResult) {
    println!("{} {}", "==>".blue(), agent.bold());
    println!("{}", result.details.dimmed());

    for issue in &result.issues {
        println!("  {} {issue}", "error:".red().bold());
    }
    for warning in &result.warnings {
        println!("  {} {warning}", "warning:".yellow());
    }
    for rec in &result.recommendations {
        println!("  {} {rec}", "note:".cyan());
    }

    if result.success {
        println!("{}", "OK".green().bold());
    } else {
        println!("{}", "FAILED".red().bold());
    }
}

/// Prints each gate step and the final decision.
pub fn print_quality_report(report: &QualityReport) {
    println!("{} {}", "==>".blue(), "Quality gate".bold());
    for check in report.checks() {
        print_check(check);
    }
    if report.test_summary.total > 0 {
        println!(
            "     tests: {} failed of {}",
            report.test_summary.failed, report.test_summary.total
        );
    }
    match report.decision {
        Decision::Go => println!("\nDecision: {}", "GO".green().bold()),
        Decision::NoGo => println!("\nDecision: {}", "NO-GO".red().bold()),
    }
}

fn print_check(check: &CheckOutcome) {
    let mark = match check.status {
        CheckStatus::Passed => "ok".green(),
        CheckStatus::Failed => "FAILED".red().bold(),
        CheckStatus::Skipped => "skipped".dimmed(),
    };
    println!(
        "  {:<10} {mark}  ({} {}, {} {})",
        check.name,
        check.errors,
        pluralize("error", check.errors),
        check.warnings,
        pluralize("warning", check.warnings)
    );
    if let Some(note) = &check.note {
        for line in note.lines().take(8) {
            println!("     {}", line.dimmed());
        }
    }
}

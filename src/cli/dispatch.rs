//! Literal command table and handlers.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use tracing::debug;

use crate::agents::{
    run_tracked, Agent, ArchitectureAgent, CodeAuditorAgent, Decision, FrontEndAgent,
    QualityAgent, SecurityAgent, TaskContext, TaskResult,
};
use crate::config::AuditConfig;
use crate::exit::AuditExit;
use crate::perf::PerformanceTracker;
use crate::reporting::{print_audit_report, print_quality_report, print_task_result};
use crate::workflow::{generate_validation_report, validate_multiple_agents, AgentExecution};

/// Every command with its one-line description, as listed by `!comandos`.
pub const COMMANDS: &[(&str, &str)] = &[
    ("!comandos", "list the available commands"),
    ("!rever codigo", "full code audit; writes the Markdown report, fails on P0"),
    ("!arquitetura", "architecture review; fails on layer or size errors"),
    ("!seguranca", "security scan; fails on P0 vulnerabilities"),
    ("!frontend", "component review; fails on blocking issues"),
    ("!qualidade", "lint, typecheck, build and test; fails on NO-GO"),
    ("!validar workflow FILE", "validate agent step logs from a JSON file"),
];

/// Runs the command spelled by `words` against the project at `root`.
///
/// # Errors
/// Returns error if the configuration or an input file cannot be read.
pub async fn execute(root: &Path, words: &[&str]) -> Result<AuditExit> {
    let key: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
    let key: Vec<&str> = key.iter().map(String::as_str).collect();

    match key.as_slice() {
        [] | ["!comandos"] => {
            print_commands();
            Ok(AuditExit::Success)
        }
        ["!rever", "codigo" | "código"] => review_code(root),
        ["!arquitetura"] => run_agent(root, &ArchitectureAgent).await,
        ["!seguranca" | "!segurança"] => run_agent(root, &SecurityAgent).await,
        ["!frontend"] => frontend(root).await,
        ["!qualidade"] => quality(root).await,
        ["!validar", "workflow", _] => validate_workflow(Path::new(words[2])),
        ["!validar", "workflow"] => bail!("usage: !validar workflow FILE"),
        _ => {
            eprintln!("{} {}", "command not found:".red().bold(), words.join(" "));
            eprintln!("Run `portal-audit !comandos` for the list.");
            Ok(AuditExit::UnknownCommand)
        }
    }
}

fn print_commands() {
    println!("{}", "Available commands:".bold());
    for (name, about) in COMMANDS {
        println!("  {:<24} {about}", name.cyan());
    }
}

fn context(root: &Path) -> Result<TaskContext> {
    let config = AuditConfig::load(root)?;
    Ok(TaskContext::discover(root, config))
}

fn review_code(root: &Path) -> Result<AuditExit> {
    let ctx = context(root)?;
    let auditor = CodeAuditorAgent::new();
    let report = auditor.audit_project(&ctx);
    print_audit_report(&report);

    let path = auditor.save_report(&ctx, &report)?;
    println!("Report saved to {}", path.display());
    Ok(AuditExit::from_passed(!report.has_critical()))
}

/// Runs one agent with timing; the timing report is logged at debug level.
async fn timed(agent: &dyn Agent, ctx: &TaskContext) -> Result<TaskResult> {
    let mut tracker = PerformanceTracker::new();
    let result = run_tracked(agent, "cli", ctx, &mut tracker).await;
    debug!("{}", tracker.generate_report("cli"));
    Ok(result?)
}

async fn run_agent(root: &Path, agent: &dyn Agent) -> Result<AuditExit> {
    let ctx = context(root)?;
    let result = timed(agent, &ctx).await?;
    print_task_result(agent.name(), &result);
    Ok(AuditExit::from_passed(result.success))
}

async fn frontend(root: &Path) -> Result<AuditExit> {
    let ctx = context(root)?;
    let agent = FrontEndAgent;
    let result = timed(&agent, &ctx).await?;
    println!("{}", agent.generate_report(&result));
    Ok(AuditExit::from_passed(result.success))
}

async fn quality(root: &Path) -> Result<AuditExit> {
    let ctx = TaskContext::new(root, Vec::new(), AuditConfig::load(root)?);
    let mut tracker = PerformanceTracker::new();
    let id = tracker.start_tracking("Quality", "cli", "run");
    let report = QualityAgent::default().run(&ctx).await;
    tracker.end_tracking(id, report.decision == Decision::Go, None);
    debug!("{}", tracker.generate_report("cli"));
    print_quality_report(&report);
    Ok(AuditExit::from_passed(report.decision == Decision::Go))
}

fn validate_workflow(file: &Path) -> Result<AuditExit> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let executions: Vec<AgentExecution> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON array of executions", file.display()))?;

    let summary = validate_multiple_agents(&executions);
    for detail in &summary.details {
        println!("{}", generate_validation_report(&detail.agent_name, &detail.validation));
    }
    let verdict = format!(
        "{} compliant, {} non-compliant",
        summary.compliant_count, summary.non_compliant_count
    );
    if summary.all_compliant {
        println!("{}", verdict.green().bold());
    } else {
        println!("{}", verdict.red().bold());
    }
    Ok(AuditExit::from_passed(summary.all_compliant))
}

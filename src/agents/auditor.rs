use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use super::{Agent, TaskContext, TaskResult};
use crate::error::Result;
use crate::reporting::{render_summary, write_report};
use crate::rules::{self, AUDITOR_RULES};
use crate::types::{AuditReport, Violation};

/// Whole-project audit with every general rule; backs `!rever codigo`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CodeAuditorAgent;

impl CodeAuditorAgent {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Audits every file in `ctx` and renders the summary.
    #[must_use]
    pub fn audit_project(&self, ctx: &TaskContext) -> AuditReport {
        info!("auditing {} files", ctx.files().len());
        let violations = ctx.scan(AUDITOR_RULES);
        let mut report = AuditReport::from_violations(ctx.files().len(), violations);
        report.summary = render_summary(report.total_files, &report.violations);
        report
    }

    /// Violations for one file. An unreadable file yields none.
    #[must_use]
    pub fn audit_file(&self, ctx: &TaskContext, path: &Path) -> Vec<Violation> {
        ctx.load(path)
            .map(|file| rules::apply(AUDITOR_RULES, &file, &ctx.config().rules))
            .unwrap_or_default()
    }

    /// Writes the Markdown report under the project root.
    ///
    /// # Errors
    /// Returns error if the report file cannot be written.
    pub fn save_report(&self, ctx: &TaskContext, report: &AuditReport) -> Result<PathBuf> {
        write_report(report, &ctx.root().join(&ctx.config().report.path))
    }
}

#[async_trait]
impl Agent for CodeAuditorAgent {
    fn name(&self) -> &'static str {
        "CodeAuditor"
    }

    async fn execute_task(&self, _task: &str, ctx: &TaskContext) -> Result<TaskResult> {
        let report = self.audit_project(ctx);
        let details = format!(
            "Files: {}, violations: {} (P0={}, P1={}, P2={})",
            report.total_files,
            report.total_violations,
            report.p0_count,
            report.p1_count,
            report.p2_count
        );
        Ok(TaskResult::from_violations(report.violations, details))
    }
}

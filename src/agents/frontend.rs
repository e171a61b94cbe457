use std::fmt::Write as _;

use async_trait::async_trait;
use tracing::info;

use super::{Agent, TaskContext, TaskResult};
use crate::error::Result;
use crate::rules::FRONTEND_RULES;
use crate::types::Severity;

/// UI review of component files: states, accessibility, images, layout.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrontEndAgent;

impl FrontEndAgent {
    /// Text report of one front-end review.
    #[must_use]
    pub fn generate_report(&self, result: &TaskResult) -> String {
        let mut out = String::from("FRONT-END REVIEW\n\n");
        let _ = writeln!(out, "{}", result.details);

        for (heading, items) in [
            ("Issues", &result.issues),
            ("Warnings", &result.warnings),
            ("Recommendations", &result.recommendations),
        ] {
            if items.is_empty() {
                continue;
            }
            let _ = writeln!(out, "\n{heading} ({}):", items.len());
            for item in items {
                let _ = writeln!(out, "  - {item}");
            }
        }

        let verdict = if result.success { "APPROVED" } else { "CHANGES REQUIRED" };
        let _ = writeln!(out, "\nStatus: {verdict}");
        out
    }
}

#[async_trait]
impl Agent for FrontEndAgent {
    fn name(&self) -> &'static str {
        "FrontEnd"
    }

    async fn execute_task(&self, task: &str, ctx: &TaskContext) -> Result<TaskResult> {
        info!("front-end review: {task}");
        let component_files: Vec<_> = ctx
            .files()
            .iter()
            .filter(|p| p.extension().is_some_and(|e| e == "tsx" || e == "jsx"))
            .collect();

        let mut violations = Vec::new();
        for path in &component_files {
            if let Some(file) = ctx.load(path) {
                violations.extend(crate::rules::apply(FRONTEND_RULES, &file, &ctx.config().rules));
            }
        }

        let mut result = TaskResult::from_violations(violations, String::new());
        result.details = format!(
            "Components: {}, issues: {}, warnings: {}, recommendations: {}",
            component_files.len(),
            result.count(Severity::P0),
            result.count(Severity::P1),
            result.count(Severity::P2)
        );
        Ok(result)
    }
}

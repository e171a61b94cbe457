use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use super::{Agent, TaskContext, TaskResult};
use crate::error::Result;
use crate::reporting::pluralize;
use crate::rules::ARCHITECTURE_RULES;
use crate::types::{Severity, Violation};

/// Two-level scale used by the architecture review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Warning,
}

impl From<Severity> for Level {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::P0 => Level::Error,
            Severity::P1 | Severity::P2 => Level::Warning,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Error => "error",
            Level::Warning => "warning",
        })
    }
}

/// Structure review: file size, duplication, layering, naming.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArchitectureAgent;

impl ArchitectureAgent {
    /// Every finding with its level, in scan order.
    #[must_use]
    pub fn analyze(&self, ctx: &TaskContext) -> Vec<(Level, Violation)> {
        ctx.scan(ARCHITECTURE_RULES)
            .into_iter()
            .map(|v| (Level::from(v.severity), v))
            .collect()
    }
}

#[async_trait]
impl Agent for ArchitectureAgent {
    fn name(&self) -> &'static str {
        "Architecture"
    }

    async fn execute_task(&self, task: &str, ctx: &TaskContext) -> Result<TaskResult> {
        info!("architecture review: {task}");
        let findings = self.analyze(ctx);
        let errors = findings.iter().filter(|(l, _)| *l == Level::Error).count();
        let warnings = findings.len() - errors;

        let mut result = TaskResult {
            success: errors == 0,
            details: format!(
                "Architecture: {errors} {}, {warnings} {}",
                pluralize("error", errors),
                pluralize("warning", warnings)
            ),
            ..TaskResult::default()
        };
        for (level, v) in findings {
            let line = format!("{}: {}", v.location(), v.message);
            match level {
                Level::Error => result.issues.push(line),
                Level::Warning => result.warnings.push(line),
            }
            result.violations.push(v);
        }
        if result.violations.iter().any(|v| v.kind == "code-duplication") {
            result
                .recommendations
                .push("Extract repeated blocks into shared helpers or components".to_string());
        }
        Ok(result)
    }
}

// src/agents/mod.rs
//! Cooperating audit agents.
//!
//! Each agent runs one family of checks over a [`TaskContext`] and reports a
//! [`TaskResult`]. File contents are shared through the context's loader, so
//! running several agents over one tree reads each file once.

mod architecture;
mod auditor;
mod frontend;
mod quality;
mod security;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::CacheStats;
use crate::config::AuditConfig;
use crate::discovery::find_project_files;
use crate::error::Result;
use crate::perf::PerformanceTracker;
use crate::rules::{self, Rule};
use crate::source::{SourceFile, SourceLoader};
use crate::types::{Severity, Violation};

pub use architecture::{ArchitectureAgent, Level};
pub use auditor::CodeAuditorAgent;
pub use frontend::FrontEndAgent;
pub use quality::{
    CheckOutcome, CheckStatus, Decision, ProcessRunner, QualityAgent, QualityReport, TestSummary,
    ToolRunner,
};
pub use security::SecurityAgent;

#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &'static str;

    /// Runs `task` (free text, informational) against the project in `ctx`.
    ///
    /// # Errors
    /// Returns error only for failures outside the checks themselves;
    /// findings are reported in the result.
    async fn execute_task(&self, task: &str, ctx: &TaskContext) -> Result<TaskResult>;
}

/// Runs `agent` on `task`, timing the run as one `execute_task` step of
/// `task` in `tracker`. A run that errors is recorded as failed.
///
/// # Errors
/// Returns the agent's own error.
pub async fn run_tracked(
    agent: &dyn Agent,
    task: &str,
    ctx: &TaskContext,
    tracker: &mut PerformanceTracker,
) -> Result<TaskResult> {
    let id = tracker.start_tracking(agent.name(), task, "execute_task");
    let outcome = agent.execute_task(task, ctx).await;
    match &outcome {
        Ok(result) => tracker.end_tracking(id, result.success, None),
        Err(e) => tracker.end_tracking(id, false, Some(&e.to_string())),
    };
    outcome
}

/// What an agent reports back.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskResult {
    pub success: bool,
    pub details: String,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
    pub violations: Vec<Violation>,
}

impl TaskResult {
    /// Sorts violations into issues (P0), warnings (P1) and recommendations
    /// (P2). Succeeds when there are no issues.
    #[must_use]
    pub fn from_violations(violations: Vec<Violation>, details: impl Into<String>) -> Self {
        let mut result = Self {
            details: details.into(),
            ..Self::default()
        };
        for v in &violations {
            let line = format!("{}: {}", v.location(), v.message);
            match v.severity {
                Severity::P0 => result.issues.push(line),
                Severity::P1 => result.warnings.push(line),
                Severity::P2 => result.recommendations.push(line),
            }
        }
        result.success = result.issues.is_empty();
        result.violations = violations;
        result
    }

    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.violations.iter().filter(|v| v.severity == severity).count()
    }
}

/// A project under audit: its root, the files to scan, and the settings.
pub struct TaskContext {
    root: PathBuf,
    files: Vec<PathBuf>,
    config: AuditConfig,
    loader: Mutex<SourceLoader>,
}

impl TaskContext {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, files: Vec<PathBuf>, config: AuditConfig) -> Self {
        let root = root.into();
        let loader = SourceLoader::new(&root, &config.cache);
        Self {
            root,
            files,
            config,
            loader: Mutex::new(loader),
        }
    }

    /// Context over every source file found under `root`.
    #[must_use]
    pub fn discover(root: impl Into<PathBuf>, config: AuditConfig) -> Self {
        let root = root.into();
        let files = find_project_files(&root, &config.scan);
        debug!("discovered {} source files under {}", files.len(), root.display());
        Self::new(root, files, config)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    #[must_use]
    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Reads one file, or logs and returns `None` if it cannot be read.
    #[must_use]
    pub fn load(&self, path: &Path) -> Option<SourceFile> {
        let mut loader = self.loader.lock().unwrap_or_else(PoisonError::into_inner);
        match loader.load(path) {
            Ok(file) => Some(file),
            Err(e) => {
                warn!("skipping {}: {e}", path.display());
                None
            }
        }
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.loader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cache_stats()
    }

    /// Runs `rules` over every readable file, in file order then rule order.
    #[must_use]
    pub fn scan(&self, rules: &[Rule]) -> Vec<Violation> {
        let mut out = Vec::new();
        for path in &self.files {
            if let Some(file) = self.load(path) {
                out.extend(rules::apply(rules, &file, &self.config.rules));
            }
        }
        out
    }
}

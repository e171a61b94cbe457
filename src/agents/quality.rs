// src/agents/quality.rs
//! Quality gate: lint, typecheck, build and test through the project's own
//! tooling, folded into a GO / NO-GO decision.

use std::fmt::{self, Write as _};
use std::io;
use std::path::Path;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use tokio::process::Command;
use tracing::{info, warn};

use super::{Agent, TaskContext, TaskResult};
use crate::config::ToolCommand;
use crate::error::Result;
use crate::retry::{execute_with_timeout_and_retry, RetryOptions};
use crate::types::CommandResult;

/// Build output kept for a failed build.
const BUILD_EXCERPT_CHARS: usize = 500;

static TESTS_TOTAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Tests:.*?(\d+) total").unwrap_or_else(|_| panic!("Invalid Regex"))
});
static TESTS_FAILED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Tests:.*?(\d+) failed").unwrap_or_else(|_| panic!("Invalid Regex"))
});

/// Runs one command line in a directory.
///
/// A process that starts and exits non-zero is `Ok`; `Err` means the tool
/// could not be run at all.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, command: &str, cwd: &Path) -> io::Result<CommandResult>;
}

/// Spawns real child processes. The child is killed if its attempt times out.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(&self, command: &str, cwd: &Path) -> io::Result<CommandResult> {
        let parts = shell_words::split(command)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let Some((program, args)) = parts.split_first() else {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty command"));
        };

        let start = Instant::now();
        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .kill_on_drop(true)
            .output()
            .await?;
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        Ok(CommandResult::new(
            command.to_string(),
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stdout).into_owned(),
            String::from_utf8_lossy(&output.stderr).into_owned(),
            duration_ms,
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CheckStatus {
    Passed,
    Failed,
    /// Not configured or not runnable; counts as passed.
    Skipped,
}

/// Outcome of one gate step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub name: &'static str,
    pub status: CheckStatus,
    pub errors: usize,
    pub warnings: usize,
    /// Why the step was skipped, or an output excerpt for a failed build.
    pub note: Option<String>,
}

impl CheckOutcome {
    fn skipped(name: &'static str, why: impl Into<String>) -> Self {
        Self {
            name,
            status: CheckStatus::Skipped,
            errors: 0,
            warnings: 0,
            note: Some(why.into()),
        }
    }

    fn failed(name: &'static str, errors: usize, note: impl Into<String>) -> Self {
        Self {
            name,
            status: CheckStatus::Failed,
            errors,
            warnings: 0,
            note: Some(note.into()),
        }
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.status != CheckStatus::Failed
    }
}

/// Jest's `Tests:` line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TestSummary {
    pub total: usize,
    pub failed: usize,
}

impl TestSummary {
    /// Reads `Tests: ... N failed, ... M total`; absent numbers are zero.
    #[must_use]
    pub fn parse(output: &str) -> Self {
        let grab = |re: &Regex| {
            re.captures(output)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0)
        };
        Self {
            total: grab(&TESTS_TOTAL_RE),
            failed: grab(&TESTS_FAILED_RE),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Decision {
    #[serde(rename = "GO")]
    Go,
    #[serde(rename = "NO-GO")]
    NoGo,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Decision::Go => "GO",
            Decision::NoGo => "NO-GO",
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    pub lint: CheckOutcome,
    pub typecheck: CheckOutcome,
    pub build: CheckOutcome,
    pub tests: CheckOutcome,
    pub test_summary: TestSummary,
    pub decision: Decision,
}

impl QualityReport {
    /// NO-GO on any lint or type error, a failed build, or failed tests.
    #[must_use]
    pub fn decide(
        lint: &CheckOutcome,
        typecheck: &CheckOutcome,
        build: &CheckOutcome,
        tests: &CheckOutcome,
    ) -> Decision {
        if lint.errors > 0 || typecheck.errors > 0 || !build.passed() || !tests.passed() {
            Decision::NoGo
        } else {
            Decision::Go
        }
    }

    #[must_use]
    pub fn checks(&self) -> [&CheckOutcome; 4] {
        [&self.lint, &self.typecheck, &self.build, &self.tests]
    }
}

/// Runs the project's lint, typecheck, build and test tooling in sequence.
pub struct QualityAgent<R: ToolRunner = ProcessRunner> {
    runner: R,
}

impl Default for QualityAgent<ProcessRunner> {
    fn default() -> Self {
        Self::new(ProcessRunner)
    }
}

impl<R: ToolRunner> QualityAgent<R> {
    #[must_use]
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Runs every step. Tool failures are findings, never errors.
    pub async fn run(&self, ctx: &TaskContext) -> QualityReport {
        let quality = &ctx.config().quality;
        let scripts = ManifestScripts::read(&ctx.root().join(&quality.manifest)).await;
        let gate = Gate {
            runner: &self.runner,
            root: ctx.root(),
            scripts: &scripts,
            timeout: Duration::from_secs(quality.timeout_secs),
            retry: RetryOptions::from(&ctx.config().retry),
        };

        let lint = gate
            .step("lint", &quality.lint, |r| {
                let errors = if r.passed() { r.error_count() } else { r.error_count().max(1) };
                CheckOutcome {
                    name: "lint",
                    status: if errors == 0 { CheckStatus::Passed } else { CheckStatus::Failed },
                    errors,
                    warnings: r.warning_count(),
                    note: None,
                }
            })
            .await;

        let typecheck = gate
            .step("typecheck", &quality.typecheck, |r| {
                let count = r.typescript_error_count();
                let errors = if r.passed() { count } else { count.max(1) };
                CheckOutcome {
                    name: "typecheck",
                    status: if errors == 0 { CheckStatus::Passed } else { CheckStatus::Failed },
                    errors,
                    warnings: 0,
                    note: None,
                }
            })
            .await;

        let build = gate
            .step("build", &quality.build, |r| {
                if r.passed() {
                    CheckOutcome {
                        name: "build",
                        status: CheckStatus::Passed,
                        errors: 0,
                        warnings: r.warning_count(),
                        note: None,
                    }
                } else {
                    CheckOutcome::failed("build", 1, r.excerpt(BUILD_EXCERPT_CHARS))
                }
            })
            .await;

        let mut test_summary = TestSummary::default();
        let tests = gate
            .step("test", &quality.test, |r| {
                test_summary = TestSummary::parse(&r.output());
                let failed = !r.passed() || test_summary.failed > 0;
                CheckOutcome {
                    name: "test",
                    status: if failed { CheckStatus::Failed } else { CheckStatus::Passed },
                    errors: test_summary.failed,
                    warnings: 0,
                    note: None,
                }
            })
            .await;

        let decision = QualityReport::decide(&lint, &typecheck, &build, &tests);
        info!("quality gate decision: {decision}");
        QualityReport {
            lint,
            typecheck,
            build,
            tests,
            test_summary,
            decision,
        }
    }
}

#[async_trait]
impl<R: ToolRunner> Agent for QualityAgent<R> {
    fn name(&self) -> &'static str {
        "Quality"
    }

    async fn execute_task(&self, _task: &str, ctx: &TaskContext) -> Result<TaskResult> {
        let report = self.run(ctx).await;

        let mut result = TaskResult {
            success: report.decision == Decision::Go,
            details: format!("Decision: {}", report.decision),
            ..TaskResult::default()
        };
        for check in report.checks() {
            let status = match check.status {
                CheckStatus::Passed => "OK",
                CheckStatus::Failed => "FAILED",
                CheckStatus::Skipped => "SKIPPED",
            };
            let _ = write!(result.details, "\n{}: {status}", check.name);
            if check.status == CheckStatus::Failed {
                result.issues.push(format!("{}: {} error(s)", check.name, check.errors));
            }
        }
        if report.lint.warnings > 0 {
            result
                .warnings
                .push(format!("lint: {} warning(s)", report.lint.warnings));
        }
        Ok(result)
    }
}

/// `scripts` table of the project manifest.
struct ManifestScripts(Option<serde_json::Map<String, serde_json::Value>>);

impl ManifestScripts {
    async fn read(path: &Path) -> Self {
        let text = match tokio::fs::read_to_string(path).await {
            Ok(t) => t,
            Err(e) => {
                warn!("no readable manifest at {}: {e}", path.display());
                return Self(None);
            }
        };
        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(serde_json::Value::Object(mut root)) => match root.remove("scripts") {
                Some(serde_json::Value::Object(scripts)) => Self(Some(scripts)),
                _ => Self(None),
            },
            Ok(_) => Self(None),
            Err(e) => {
                warn!("unparseable manifest {}: {e}", path.display());
                Self(None)
            }
        }
    }

    fn has(&self, name: &str) -> bool {
        self.0
            .as_ref()
            .and_then(|s| s.get(name))
            .and_then(serde_json::Value::as_str)
            .is_some_and(|s| !s.is_empty())
    }
}

struct Gate<'a, R> {
    runner: &'a R,
    root: &'a Path,
    scripts: &'a ManifestScripts,
    timeout: Duration,
    retry: RetryOptions,
}

impl<R: ToolRunner> Gate<'_, R> {
    async fn step(
        &self,
        name: &'static str,
        tool: &ToolCommand,
        evaluate: impl FnOnce(&CommandResult) -> CheckOutcome,
    ) -> CheckOutcome {
        if let Some(script) = tool.script.as_deref() {
            if !self.scripts.has(script) {
                info!("{name}: no \"{script}\" script, skipped");
                return CheckOutcome::skipped(name, format!("no \"{script}\" script configured"));
            }
        }

        let (runner, root, command) = (self.runner, self.root, tool.command.as_str());
        let run = execute_with_timeout_and_retry(
            move || runner.run(command, root),
            self.timeout,
            &self.retry,
            Some(name),
        )
        .await;

        match run {
            Ok(result) => {
                let outcome = evaluate(&result);
                info!(
                    "{name}: {:?} ({} errors, {} warnings) in {}ms",
                    outcome.status,
                    outcome.errors,
                    outcome.warnings,
                    result.duration_ms()
                );
                outcome
            }
            Err(e) if e.is_timeout() => {
                warn!("{name}: {e}");
                CheckOutcome::failed(name, 1, e.to_string())
            }
            Err(e) => {
                warn!("{name}: tool unavailable: {e}");
                CheckOutcome::skipped(name, format!("tool unavailable: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuditConfig;
    use std::collections::HashMap;
    use std::fs;
    use std::sync::Mutex;

    #[derive(Clone)]
    enum Canned {
        Exit(i32, &'static str),
        Missing,
        Hang,
    }

    #[derive(Default)]
    struct FakeRunner {
        canned: HashMap<&'static str, Canned>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeRunner {
        fn with(mut self, command: &'static str, reply: Canned) -> Self {
            self.canned.insert(command, reply);
            self
        }
    }

    #[async_trait]
    impl ToolRunner for FakeRunner {
        async fn run(&self, command: &str, _cwd: &Path) -> io::Result<CommandResult> {
            self.calls.lock().unwrap().push(command.to_string());
            match self.canned.get(command).cloned().unwrap_or(Canned::Exit(0, "")) {
                Canned::Exit(code, out) => {
                    Ok(CommandResult::new(command.into(), code, out.into(), String::new(), 1))
                }
                Canned::Missing => Err(io::Error::new(io::ErrorKind::NotFound, "not found")),
                Canned::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(CommandResult::new(command.into(), 0, String::new(), String::new(), 1))
                }
            }
        }
    }

    const LINT: &str = "npm run lint";
    const TSC: &str = "npx tsc --noEmit";
    const BUILD: &str = "npm run build";
    const TEST: &str = "npm run test -- --passWithNoTests";

    fn project(scripts: &str) -> (tempfile::TempDir, TaskContext) {
        let d = tempfile::tempdir().unwrap();
        fs::write(d.path().join("package.json"), format!("{{\"scripts\": {{{scripts}}}}}")).unwrap();
        let ctx = TaskContext::new(d.path(), Vec::new(), AuditConfig::default());
        (d, ctx)
    }

    fn all_scripts() -> &'static str {
        "\"lint\": \"next lint\", \"build\": \"next build\", \"test\": \"jest\""
    }

    #[tokio::test]
    async fn clean_tooling_is_go() {
        let (_d, ctx) = project(all_scripts());
        let runner = FakeRunner::default().with(
            TEST,
            Canned::Exit(0, "Tests:       12 passed, 12 total"),
        );
        let agent = QualityAgent::new(runner);
        let report = agent.run(&ctx).await;

        assert_eq!(report.decision, Decision::Go);
        assert_eq!(report.test_summary, TestSummary { total: 12, failed: 0 });
        assert_eq!(agent.runner.calls.lock().unwrap().as_slice(), [LINT, TSC, BUILD, TEST]);
    }

    #[tokio::test]
    async fn missing_scripts_are_skipped_not_failed() {
        let (_d, ctx) = project("");
        let agent = QualityAgent::new(FakeRunner::default());
        let report = agent.run(&ctx).await;

        assert_eq!(report.lint.status, CheckStatus::Skipped);
        assert_eq!(report.build.status, CheckStatus::Skipped);
        assert_eq!(report.tests.status, CheckStatus::Skipped);
        assert_eq!(report.typecheck.status, CheckStatus::Passed);
        assert_eq!(report.decision, Decision::Go);
        assert_eq!(agent.runner.calls.lock().unwrap().as_slice(), [TSC]);
    }

    #[tokio::test]
    async fn unavailable_tool_counts_as_passed() {
        let (_d, ctx) = project(all_scripts());
        let agent = QualityAgent::new(FakeRunner::default().with(TSC, Canned::Missing));
        let report = agent.run(&ctx).await;
        assert_eq!(report.typecheck.status, CheckStatus::Skipped);
        assert_eq!(report.decision, Decision::Go);
    }

    #[tokio::test]
    async fn lint_errors_block() {
        let (_d, ctx) = project(all_scripts());
        let runner = FakeRunner::default().with(
            LINT,
            Canned::Exit(1, "./app/page.tsx\n4:7  error  'x' is assigned a value but never used\n"),
        );
        let report = QualityAgent::new(runner).run(&ctx).await;
        assert_eq!(report.lint.errors, 1);
        assert_eq!(report.decision, Decision::NoGo);
    }

    #[tokio::test]
    async fn nonzero_typecheck_counts_at_least_one_error() {
        let (_d, ctx) = project(all_scripts());
        let runner = FakeRunner::default().with(TSC, Canned::Exit(2, "something went wrong"));
        let report = QualityAgent::new(runner).run(&ctx).await;
        assert_eq!(report.typecheck.errors, 1);
        assert_eq!(report.decision, Decision::NoGo);
    }

    #[tokio::test]
    async fn failed_build_keeps_an_excerpt() {
        let (_d, ctx) = project(all_scripts());
        let runner = FakeRunner::default().with(BUILD, Canned::Exit(1, "Module not found: ./x"));
        let report = QualityAgent::new(runner).run(&ctx).await;
        assert_eq!(report.build.status, CheckStatus::Failed);
        assert_eq!(report.build.note.as_deref(), Some("Module not found: ./x"));
        assert_eq!(report.decision, Decision::NoGo);
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_step_is_retried_then_fails() {
        let d = tempfile::tempdir().unwrap();
        fs::write(
            d.path().join("package.json"),
            format!("{{\"scripts\": {{{}}}}}", all_scripts()),
        )
        .unwrap();
        let mut config = AuditConfig::default();
        config.quality.timeout_secs = 5;
        let ctx = TaskContext::new(d.path(), Vec::new(), config);

        let agent = QualityAgent::new(FakeRunner::default().with(BUILD, Canned::Hang));
        let report = agent.run(&ctx).await;

        assert_eq!(report.build.status, CheckStatus::Failed);
        assert_eq!(report.build.errors, 1);
        let note = report.build.note.as_deref().unwrap_or_default();
        assert!(note.contains("Failed after 3 attempts"), "{note}");
        assert!(note.contains("Timeout after 5000ms"), "{note}");
        assert_eq!(report.decision, Decision::NoGo);

        let calls = agent.runner.calls.lock().unwrap();
        assert_eq!(calls.iter().filter(|c| c.as_str() == BUILD).count(), 3);
        assert_eq!(calls.last().map(String::as_str), Some(TEST));
    }

    #[tokio::test]
    async fn failing_tests_block_and_are_counted() {
        let (_d, ctx) = project(all_scripts());
        let runner = FakeRunner::default().with(
            TEST,
            Canned::Exit(1, "Tests:       2 failed, 8 passed, 10 total"),
        );
        let agent = QualityAgent::new(runner);
        let result = agent.execute_task("gate", &ctx).await.unwrap();

        assert!(!result.success);
        assert!(result.details.starts_with("Decision: NO-GO"));
        assert_eq!(result.issues, vec!["test: 2 error(s)"]);
    }

    #[test]
    fn jest_summary_parsing() {
        assert_eq!(
            TestSummary::parse("Tests:       1 failed, 5 passed, 6 total"),
            TestSummary { total: 6, failed: 1 }
        );
        assert_eq!(TestSummary::parse("No tests found"), TestSummary::default());
    }

    #[tokio::test]
    async fn process_runner_reports_spawn_failure() {
        let d = tempfile::tempdir().unwrap();
        let err = ProcessRunner
            .run("definitely_not_a_real_tool_xyz --flag", d.path())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(ProcessRunner.run("", d.path()).await.is_err());
    }
}

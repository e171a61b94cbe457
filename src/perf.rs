// src/perf.rs
//! Step timing for agent runs.
//!
//! A step is opened with [`PerformanceTracker::start_tracking`] and closed
//! with [`PerformanceTracker::end_tracking`]. Closed steps become
//! [`StepMetric`]s, which roll up into per-agent summaries (nearest-rank
//! percentiles) and a per-task report naming the slowest agents.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::cache::{Clock, SystemClock};

/// Metrics kept by [`PerformanceTracker::clear_old_metrics`] by default.
pub const DEFAULT_KEEP: usize = 1000;

/// Average duration above which a bottleneck agent is reported as slow.
const SLOW_AVERAGE_MS: f64 = 10_000.0;
const FAILURE_RATE_LIMIT: f64 = 0.1;
const VARIABILITY_LIMIT: f64 = 5.0;
const VARIABILITY_MIN_RUNS: usize = 5;

/// Handle for an open step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackingId(u64);

/// One closed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepMetric {
    pub agent_name: String,
    pub task_id: String,
    pub step_name: String,
    pub start_ms: u64,
    pub end_ms: u64,
    pub duration_ms: u64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Duration statistics for one agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSummary {
    pub agent_name: String,
    pub total_executions: usize,
    pub successful_executions: usize,
    pub failed_executions: usize,
    pub average_ms: f64,
    pub min_ms: u64,
    pub max_ms: u64,
    pub p50_ms: u64,
    pub p95_ms: u64,
    pub p99_ms: u64,
}

impl AgentSummary {
    #[allow(clippy::cast_precision_loss)]
    fn from_metrics<'a>(agent_name: &str, metrics: impl Iterator<Item = &'a StepMetric>) -> Self {
        let mut durations = Vec::new();
        let mut successful = 0;
        for m in metrics {
            durations.push(m.duration_ms);
            if m.success {
                successful += 1;
            }
        }
        durations.sort_unstable();

        let total = durations.len();
        let average_ms = if total == 0 {
            0.0
        } else {
            durations.iter().sum::<u64>() as f64 / total as f64
        };

        Self {
            agent_name: agent_name.to_string(),
            total_executions: total,
            successful_executions: successful,
            failed_executions: total - successful,
            average_ms,
            min_ms: durations.first().copied().unwrap_or(0),
            max_ms: durations.last().copied().unwrap_or(0),
            p50_ms: percentile(&durations, 50),
            p95_ms: percentile(&durations, 95),
            p99_ms: percentile(&durations, 99),
        }
    }

    /// Failed share of executions; 0 when nothing ran.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn failure_rate(&self) -> f64 {
        if self.total_executions == 0 {
            return 0.0;
        }
        self.failed_executions as f64 / self.total_executions as f64
    }

    /// Slowest run over fastest run, with the fastest floored at 1ms.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn variability(&self) -> f64 {
        self.max_ms as f64 / self.min_ms.max(1) as f64
    }
}

/// Nearest-rank percentile of an ascending slice; 0 when empty.
fn percentile(sorted: &[u64], pct: usize) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let rank = (pct * sorted.len()).div_ceil(100).max(1);
    sorted[rank.min(sorted.len()) - 1]
}

/// Timing report for one task.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub task_id: String,
    /// Sum of the task's step durations.
    pub total_duration_ms: u64,
    /// One summary per agent, in order of first appearance.
    pub agents: Vec<AgentSummary>,
    /// Slowest 30% of agents by average duration, slowest first.
    pub bottlenecks: Vec<String>,
    pub recommendations: Vec<String>,
}

impl fmt::Display for PerformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Performance for {}: {}ms", self.task_id, self.total_duration_ms)?;
        for a in &self.agents {
            writeln!(
                f,
                "  {}: {} run(s), avg {:.1}ms, p95 {}ms, {} failed",
                a.agent_name, a.total_executions, a.average_ms, a.p95_ms, a.failed_executions
            )?;
        }
        if !self.bottlenecks.is_empty() {
            writeln!(f, "Bottlenecks: {}", self.bottlenecks.join(", "))?;
        }
        for rec in &self.recommendations {
            writeln!(f, "- {rec}")?;
        }
        Ok(())
    }
}

/// Totals across every recorded metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerStats {
    pub total_metrics: usize,
    pub total_agents: usize,
    pub total_tasks: usize,
    pub average_ms: f64,
}

struct OpenStep {
    agent_name: String,
    task_id: String,
    step_name: String,
    start_ms: u64,
}

/// Records step durations for agents and tasks.
pub struct PerformanceTracker {
    metrics: Vec<StepMetric>,
    open: HashMap<TrackingId, OpenStep>,
    next_id: u64,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for PerformanceTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerformanceTracker")
            .field("metrics", &self.metrics.len())
            .field("open", &self.open.len())
            .finish_non_exhaustive()
    }
}

impl Default for PerformanceTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceTracker {
    /// Tracker on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            metrics: Vec::new(),
            open: HashMap::new(),
            next_id: 0,
            clock,
        }
    }

    /// Opens a step and returns its handle.
    pub fn start_tracking(&mut self, agent_name: &str, task_id: &str, step_name: &str) -> TrackingId {
        let id = TrackingId(self.next_id);
        self.next_id += 1;
        self.open.insert(
            id,
            OpenStep {
                agent_name: agent_name.to_string(),
                task_id: task_id.to_string(),
                step_name: step_name.to_string(),
                start_ms: self.clock.now_ms(),
            },
        );
        id
    }

    /// Closes a step. Returns false, recording nothing, if `id` is not open.
    pub fn end_tracking(&mut self, id: TrackingId, success: bool, error: Option<&str>) -> bool {
        let Some(step) = self.open.remove(&id) else {
            warn!("tracking id {} is not open", id.0);
            return false;
        };
        let end_ms = self.clock.now_ms().max(step.start_ms);
        self.metrics.push(StepMetric {
            agent_name: step.agent_name,
            task_id: step.task_id,
            step_name: step.step_name,
            start_ms: step.start_ms,
            end_ms,
            duration_ms: end_ms - step.start_ms,
            success,
            error: error.map(str::to_string),
        });
        true
    }

    pub fn agent_metrics<'a>(&'a self, agent_name: &'a str) -> impl Iterator<Item = &'a StepMetric> {
        self.metrics.iter().filter(move |m| m.agent_name == agent_name)
    }

    pub fn task_metrics<'a>(&'a self, task_id: &'a str) -> impl Iterator<Item = &'a StepMetric> {
        self.metrics.iter().filter(move |m| m.task_id == task_id)
    }

    /// Summary over every step the agent ran, across tasks.
    #[must_use]
    pub fn agent_summary(&self, agent_name: &str) -> AgentSummary {
        AgentSummary::from_metrics(agent_name, self.agent_metrics(agent_name))
    }

    /// Report over the steps of one task. Agent summaries cover only that task.
    #[must_use]
    pub fn generate_report(&self, task_id: &str) -> PerformanceReport {
        let mut names: Vec<&str> = Vec::new();
        for m in self.task_metrics(task_id) {
            if !names.contains(&m.agent_name.as_str()) {
                names.push(&m.agent_name);
            }
        }
        let agents: Vec<AgentSummary> = names
            .iter()
            .map(|name| {
                AgentSummary::from_metrics(
                    name,
                    self.task_metrics(task_id).filter(|m| m.agent_name == *name),
                )
            })
            .collect();

        let bottlenecks = bottlenecks(&agents);
        let recommendations = recommendations(&agents, &bottlenecks);
        PerformanceReport {
            task_id: task_id.to_string(),
            total_duration_ms: self.task_metrics(task_id).map(|m| m.duration_ms).sum(),
            agents,
            bottlenecks,
            recommendations,
        }
    }

    /// Drops all but the newest `keep_last` metrics.
    pub fn clear_old_metrics(&mut self, keep_last: usize) {
        if self.metrics.len() > keep_last {
            self.metrics.drain(..self.metrics.len() - keep_last);
        }
    }

    /// Every metric as a pretty-printed JSON array.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn export_metrics(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.metrics)
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> TrackerStats {
        let mut agents: Vec<&str> = self.metrics.iter().map(|m| m.agent_name.as_str()).collect();
        agents.sort_unstable();
        agents.dedup();
        let mut tasks: Vec<&str> = self.metrics.iter().map(|m| m.task_id.as_str()).collect();
        tasks.sort_unstable();
        tasks.dedup();

        let average_ms = if self.metrics.is_empty() {
            0.0
        } else {
            self.metrics.iter().map(|m| m.duration_ms).sum::<u64>() as f64
                / self.metrics.len() as f64
        };
        TrackerStats {
            total_metrics: self.metrics.len(),
            total_agents: agents.len(),
            total_tasks: tasks.len(),
            average_ms,
        }
    }
}

fn bottlenecks(agents: &[AgentSummary]) -> Vec<String> {
    let mut by_average: Vec<&AgentSummary> = agents.iter().collect();
    by_average.sort_by(|a, b| b.average_ms.total_cmp(&a.average_ms));
    let count = (agents.len() * 3).div_ceil(10);
    by_average
        .into_iter()
        .take(count)
        .map(|a| a.agent_name.clone())
        .collect()
}

fn recommendations(agents: &[AgentSummary], bottlenecks: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    for name in bottlenecks {
        if let Some(a) = agents.iter().find(|a| &a.agent_name == name) {
            if a.average_ms > SLOW_AVERAGE_MS {
                out.push(format!(
                    "{name}: average duration {:.2}s is high; consider optimizing or caching",
                    a.average_ms / 1000.0
                ));
            }
        }
    }
    for a in agents {
        let rate = a.failure_rate();
        if rate > FAILURE_RATE_LIMIT {
            out.push(format!(
                "{}: high failure rate ({:.1}%); investigate the causes",
                a.agent_name,
                rate * 100.0
            ));
        }
    }
    for a in agents {
        if a.total_executions > VARIABILITY_MIN_RUNS && a.variability() > VARIABILITY_LIMIT {
            out.push(format!(
                "{}: duration varies {:.1}x between runs; an external dependency may be unstable",
                a.agent_name,
                a.variability()
            ));
        }
    }
    if out.is_empty() {
        out.push("Performance is within the expected range.".to_string());
    }
    out
}

// src/workflow.rs
//! Checks an agent's step log against the canonical workflow.
//!
//! Compliance depends only on required steps being completed. Ordering and
//! critical-step problems are reported as warnings.

use std::collections::HashMap;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{CRITICAL_STEPS, WORKFLOW_ORDER};

/// One logged step of an agent run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Free-form; never inspected.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub details: HashMap<String, serde_json::Value>,
}

impl WorkflowStep {
    #[must_use]
    pub fn new(name: impl Into<String>, required: bool, completed: bool) -> Self {
        Self {
            name: name.into(),
            required,
            completed,
            timestamp: None,
            details: HashMap::new(),
        }
    }

    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowValidationResult {
    pub compliant: bool,
    /// Required but incomplete, in log order.
    pub missing_steps: Vec<String>,
    pub warnings: Vec<String>,
    /// Every completed step, required or not, in log order.
    pub completed_steps: Vec<String>,
    pub total_required: usize,
    /// Completed required steps.
    pub total_completed: usize,
}

/// A named step log, as read from `!validar workflow` input.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentExecution {
    pub agent_name: String,
    #[serde(default)]
    pub steps: Vec<WorkflowStep>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentValidation {
    pub agent_name: String,
    pub validation: WorkflowValidationResult,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiAgentSummary {
    pub all_compliant: bool,
    pub compliant_count: usize,
    pub non_compliant_count: usize,
    pub details: Vec<AgentValidation>,
}

/// Validates one agent's step log.
#[must_use]
pub fn validate_agent_execution(agent_name: &str, steps: &[WorkflowStep]) -> WorkflowValidationResult {
    let required: Vec<&WorkflowStep> = steps.iter().filter(|s| s.required).collect();
    let missing_steps: Vec<String> = required
        .iter()
        .filter(|s| !s.completed)
        .map(|s| s.name.clone())
        .collect();
    let completed_steps: Vec<String> = steps
        .iter()
        .filter(|s| s.completed)
        .map(|s| s.name.clone())
        .collect();

    let mut warnings = order_warnings(steps);

    let missing_critical: Vec<&str> = CRITICAL_STEPS
        .iter()
        .copied()
        .filter(|c| !completed_steps.iter().any(|s| s == c))
        .collect();
    if !missing_critical.is_empty() {
        warnings.push(format!("Critical steps not executed: {}", missing_critical.join(", ")));
    }

    let result = WorkflowValidationResult {
        compliant: missing_steps.is_empty(),
        total_required: required.len(),
        total_completed: required.len() - missing_steps.len(),
        missing_steps,
        warnings,
        completed_steps,
    };
    tracing::debug!(
        "workflow {agent_name}: {}/{} required steps, {} warnings",
        result.total_completed,
        result.total_required,
        result.warnings.len()
    );
    result
}

/// Adjacent completed, timestamped steps that run against the canonical order.
/// Names outside the canonical list are not compared.
fn order_warnings(steps: &[WorkflowStep]) -> Vec<String> {
    let mut timed: Vec<(DateTime<Utc>, &str)> = steps
        .iter()
        .filter(|s| s.completed)
        .filter_map(|s| s.timestamp.map(|t| (t, s.name.as_str())))
        .collect();
    timed.sort_by_key(|(t, _)| *t);

    let canonical = |name: &str| WORKFLOW_ORDER.iter().position(|s| *s == name);

    timed
        .windows(2)
        .filter_map(|pair| {
            let (before, after) = (pair[0].1, pair[1].1);
            match (canonical(before), canonical(after)) {
                (Some(a), Some(b)) if a > b => Some(format!(
                    "Steps executed out of order: \"{before}\" before \"{after}\""
                )),
                _ => None,
            }
        })
        .collect()
}

/// Multi-line text rendering of one validation.
#[must_use]
pub fn generate_validation_report(agent_name: &str, result: &WorkflowValidationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n━━━ Workflow validation: {agent_name} ━━━");
    let status = if result.compliant { "✅ COMPLIANT" } else { "❌ NON-COMPLIANT" };
    let _ = writeln!(out, "Status: {status}");
    let _ = writeln!(
        out,
        "Required steps completed: {}/{}",
        result.total_completed, result.total_required
    );

    push_list(&mut out, "✅ Executed steps:", &result.completed_steps);
    push_list(&mut out, "❌ Missing steps:", &result.missing_steps);
    push_list(&mut out, "⚠️  Warnings:", &result.warnings);

    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    out
}

fn push_list(out: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{heading}");
    for item in items {
        let _ = writeln!(out, "   - {item}");
    }
}

/// Validates each execution independently and tallies compliance.
#[must_use]
pub fn validate_multiple_agents(executions: &[AgentExecution]) -> MultiAgentSummary {
    let details: Vec<AgentValidation> = executions
        .iter()
        .map(|e| AgentValidation {
            agent_name: e.agent_name.clone(),
            validation: validate_agent_execution(&e.agent_name, &e.steps),
        })
        .collect();

    let compliant_count = details.iter().filter(|d| d.validation.compliant).count();
    let non_compliant_count = details.len() - compliant_count;

    MultiAgentSummary {
        all_compliant: non_compliant_count == 0,
        compliant_count,
        non_compliant_count,
        details,
    }
}

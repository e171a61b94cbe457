// src/types/mod.rs
//! Common data structures shared by rules, agents and reporting.

mod command;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use command::CommandResult;

/// Severity tier of a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Critical / blocking.
    P0,
    /// Important.
    P1,
    /// Advisory / improvement.
    P2,
}

impl Severity {
    /// Human label used by the summary renderer.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Severity::P0 => "CRITICAL",
            Severity::P1 => "IMPORTANT",
            Severity::P2 => "IMPROVEMENT",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::P0 => "P0",
            Severity::P1 => "P1",
            Severity::P2 => "P2",
        };
        f.write_str(s)
    }
}

/// A single detected rule breach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Path relative to the project root, forward slashes.
    pub file: String,
    /// 1-based line, for line-scoped rules.
    pub line: Option<usize>,
    /// Machine-readable category, e.g. `file-too-long`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub severity: Severity,
    pub message: String,
    pub suggestion: String,
}

impl Violation {
    /// Creates a file-level violation.
    #[must_use]
    pub fn file_level(
        file: &str,
        kind: &'static str,
        severity: Severity,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            file: file.to_string(),
            line: None,
            kind,
            severity,
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a violation pinned to a 1-based line.
    #[must_use]
    pub fn at_line(
        file: &str,
        line: usize,
        kind: &'static str,
        severity: Severity,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            line: Some(line),
            ..Self::file_level(file, kind, severity, message, suggestion)
        }
    }

    /// `path` or `path:line`.
    #[must_use]
    pub fn location(&self) -> String {
        match self.line {
            Some(line) => format!("{}:{line}", self.file),
            None => self.file.clone(),
        }
    }
}

/// Aggregate result of scanning a project.
///
/// `total_violations == p0_count + p1_count + p2_count == violations.len()`
/// holds for every report built through [`AuditReport::from_violations`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub total_files: usize,
    pub total_violations: usize,
    pub p0_count: usize,
    pub p1_count: usize,
    pub p2_count: usize,
    pub violations: Vec<Violation>,
    pub summary: String,
}

impl AuditReport {
    /// Builds the report counts from an ordered violation list.
    /// The summary is left empty for the caller to render.
    #[must_use]
    pub fn from_violations(total_files: usize, violations: Vec<Violation>) -> Self {
        let count = |s: Severity| violations.iter().filter(|v| v.severity == s).count();
        Self {
            total_files,
            total_violations: violations.len(),
            p0_count: count(Severity::P0),
            p1_count: count(Severity::P1),
            p2_count: count(Severity::P2),
            violations,
            summary: String::new(),
        }
    }

    /// Returns true if any blocking (P0) violation was found.
    #[must_use]
    pub fn has_critical(&self) -> bool {
        self.p0_count > 0
    }
}

// src/rules/input.rs
//! Input validation and network error handling.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::RuleConfig;
use crate::source::SourceFile;
use crate::types::{Severity, Violation};

static VALIDATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)zod|yup|validator").unwrap_or_else(|_| panic!("Invalid Regex")));
static HANDLED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.catch|try|error").unwrap_or_else(|_| panic!("Invalid Regex")));

/// Form inputs in a file that never references a validation library.
#[must_use]
pub fn check_missing_validation(file: &SourceFile, _config: &RuleConfig) -> Vec<Violation> {
    if !file.content.contains("<input") || VALIDATOR_RE.is_match(&file.content) {
        return Vec::new();
    }
    vec![Violation::file_level(
        &file.path,
        "missing-validation",
        Severity::P1,
        "Form inputs without validation (Zod/Yup)",
        "Add a Zod or Yup schema for the form",
    )]
}

/// Network calls with no error handling in the following lines.
///
/// The window starts at the call line and spans `error_handling_lookahead` lines.
#[must_use]
pub fn check_unhandled_network(file: &SourceFile, config: &RuleConfig) -> Vec<Violation> {
    let lines = file.line_vec();
    let mut out = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        if !line.contains("fetch(") && !line.contains("axios.") {
            continue;
        }
        let end = (idx + config.error_handling_lookahead).min(lines.len());
        let handled = lines[idx..end].iter().any(|l| HANDLED_RE.is_match(l));
        if !handled {
            out.push(Violation::at_line(
                &file.path,
                idx + 1,
                "missing-error-handling",
                Severity::P1,
                "fetch() or axios call without error handling",
                "Add .catch() or wrap the call in try/catch",
            ));
        }
    }
    out
}

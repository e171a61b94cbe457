// src/rules/typing.rs
use regex::Regex;
use std::sync::LazyLock;

use crate::config::RuleConfig;
use crate::source::SourceFile;
use crate::types::{Severity, Violation};

pub(crate) static ANY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":\s*any\b").unwrap_or_else(|_| panic!("Invalid Regex")));

const JUSTIFIED: &str = "// justified";
const PENDING: &str = "TODO";

/// Flags `: any` annotations lacking a `// justified` or `TODO` marker on the same line.
#[must_use]
pub fn check_untyped_any(file: &SourceFile, _config: &RuleConfig) -> Vec<Violation> {
    file.lines()
        .enumerate()
        .filter(|(_, line)| {
            ANY_RE.is_match(line) && !line.contains(JUSTIFIED) && !line.contains(PENDING)
        })
        .map(|(idx, _)| {
            Violation::at_line(
                &file.path,
                idx + 1,
                "typescript-any",
                Severity::P1,
                "\"any\" used without justification",
                "Use a specific type, or \"unknown\" plus a type guard",
            )
        })
        .collect()
}

//! Plain-text audit summary, embedded in both console and Markdown output.

use std::fmt::Write as _;

use super::shared::type_counts;
use crate::types::{Severity, Violation};

/// Above this many P1 violations only their count is shown.
pub const P1_DETAIL_LIMIT: usize = 10;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Renders the summary for `violations` found across `total_files` files.
#[must_use]
pub fn render_summary(total_files: usize, violations: &[Violation]) -> String {
    let p0: Vec<&Violation> = by_severity(violations, Severity::P0);
    let p1: Vec<&Violation> = by_severity(violations, Severity::P1);
    let p2_count = by_severity(violations, Severity::P2).len();

    let mut out = String::new();
    let _ = writeln!(out, "{RULE}\nAUDIT REPORT\n{RULE}\n");
    let _ = writeln!(out, "Files analyzed: {total_files}");
    let _ = writeln!(out, "Total violations: {}\n", violations.len());
    let _ = writeln!(out, "P0 ({}): {}", Severity::P0.label(), p0.len());
    let _ = writeln!(out, "P1 ({}): {}", Severity::P1.label(), p1.len());
    let _ = writeln!(out, "P2 ({}): {p2_count}\n", Severity::P2.label());

    out.push_str("Violations by type:\n");
    for (kind, count) in type_counts(violations) {
        let _ = writeln!(out, "  - {kind}: {count}");
    }
    let _ = writeln!(out, "\n{RULE}");

    if !p0.is_empty() {
        out.push_str("\nP0 - CRITICAL BLOCKERS:\n\n");
        push_details(&mut out, &p0);
    }

    if p1.len() > P1_DETAIL_LIMIT {
        let _ = writeln!(out, "\nP1 - IMPORTANT: {} (details omitted)", p1.len());
    } else if !p1.is_empty() {
        out.push_str("\nP1 - IMPORTANT:\n\n");
        push_details(&mut out, &p1);
    }

    let _ = writeln!(out, "\n{RULE}");
    out.push_str("NEXT STEPS:\n");
    out.push_str("1. Fix every P0 violation (critical blockers)\n");
    out.push_str("2. Review P1 violations (important for quality)\n");
    out.push_str("3. Consider P2 violations (optional improvements)\n");
    out.push_str("4. Run the audit again after fixing to confirm\n");
    let _ = writeln!(out, "{RULE}\n");
    out
}

fn by_severity(violations: &[Violation], severity: Severity) -> Vec<&Violation> {
    violations.iter().filter(|v| v.severity == severity).collect()
}

fn push_details(out: &mut String, list: &[&Violation]) {
    for (i, v) in list.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, v.location());
        let _ = writeln!(out, "   {}", v.message);
        let _ = writeln!(out, "   fix: {}\n", v.suggestion);
    }
}

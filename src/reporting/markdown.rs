//! Markdown report file.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};

use crate::error::{AuditError, Result};
use crate::types::AuditReport;

/// Renders the report document dated `date`.
#[must_use]
pub fn render_markdown(report: &AuditReport, date: NaiveDate) -> String {
    let mut out = String::from("# Code Audit Report\n\n");
    let _ = writeln!(out, "**Date**: {}", date.format("%Y-%m-%d"));
    let _ = writeln!(out, "**Files analyzed**: {}", report.total_files);
    let _ = writeln!(out, "**Total violations**: {}\n", report.total_violations);

    out.push_str("## Summary\n\n");
    let _ = writeln!(out, "- P0 (critical): {}", report.p0_count);
    let _ = writeln!(out, "- P1 (important): {}", report.p1_count);
    let _ = writeln!(out, "- P2 (improvement): {}\n", report.p2_count);

    out.push_str("```text\n");
    out.push_str(&report.summary);
    if !report.summary.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("```\n");
    out
}

/// Writes today's report to `path`, creating parent directories.
///
/// # Errors
/// Returns error if the directory or file cannot be written.
pub fn write_report(report: &AuditReport, path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| AuditError::io(e, parent))?;
    }
    let content = render_markdown(report, Utc::now().date_naive());
    fs::write(path, content).map_err(|e| AuditError::io(e, path))?;
    tracing::info!("report written to {}", path.display());
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Severity, Violation};

    fn report() -> AuditReport {
        let mut r = AuditReport::from_violations(
            3,
            vec![Violation::file_level("a.tsx", "xss-vulnerability", Severity::P0, "m", "s")],
        );
        r.summary = "AUDIT REPORT\n".into();
        r
    }

    #[test]
    fn document_carries_date_and_counts() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let md = render_markdown(&report(), date);
        assert!(md.starts_with("# Code Audit Report"));
        assert!(md.contains("**Date**: 2024-03-09"));
        assert!(md.contains("**Files analyzed**: 3"));
        assert!(md.contains("- P0 (critical): 1"));
        assert!(md.contains("- P2 (improvement): 0"));
        assert!(md.contains("```text\nAUDIT REPORT\n```"));
    }

    #[test]
    fn write_creates_missing_directories() {
        let d = tempfile::tempdir().unwrap();
        let target = d.path().join("docs/nested/AUDIT_REPORT.md");
        let written = write_report(&report(), &target).unwrap();
        assert_eq!(written, target);
        let text = fs::read_to_string(&target).unwrap();
        assert!(text.contains("**Total violations**: 1"));
    }
}

//! Result of one external tool invocation (lint, typecheck, build, test).

use serde::Serialize;

/// Captured outcome of an external tool process.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResult {
    /// The command line as configured.
    command: String,
    /// Process exit code (-1 if unavailable, e.g., killed by signal).
    exit_code: i32,
    stdout: String,
    stderr: String,
    duration_ms: u64,
}

impl CommandResult {
    #[must_use]
    pub fn new(
        command: String,
        exit_code: i32,
        stdout: String,
        stderr: String,
        duration_ms: u64,
    ) -> Self {
        Self {
            command,
            exit_code,
            stdout,
            stderr,
            duration_ms,
        }
    }

    /// Whether the tool exited with status 0.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.exit_code == 0
    }

    /// Combined stdout and stderr output.
    #[must_use]
    pub fn output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }

    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Lines reporting an error, in ESLint's tabular form (`3:10  error  ...`)
    /// or the `error:` prefix form most tools use.
    #[must_use]
    pub fn error_count(&self) -> usize {
        count_matching_lines(&self.output(), |lower| {
            lower.contains("error:") || lower.contains(" error ") || lower.starts_with("error")
        })
    }

    /// Lines reporting a warning.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        count_matching_lines(&self.output(), |lower| {
            lower.contains("warning:") || lower.contains(" warning ") || lower.starts_with("warn")
        })
    }

    /// TypeScript compiler diagnostics (`error TS2322: ...`).
    #[must_use]
    pub fn typescript_error_count(&self) -> usize {
        self.output().matches("error TS").count()
    }

    /// First `max` characters of the output, kept as a failure excerpt.
    #[must_use]
    pub fn excerpt(&self, max: usize) -> String {
        self.output().chars().take(max).collect()
    }
}

/// Counts lines in `text` where `predicate` matches the lowercased line.
fn count_matching_lines(text: &str, predicate: impl Fn(&str) -> bool) -> usize {
    text.lines()
        .filter(|line| predicate(&line.to_lowercase()))
        .count()
}

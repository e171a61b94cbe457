// src/exit.rs
//! Standardized process exit codes for `portal-audit`.
//!
//! Scripts and CI jobs rely on 0 vs non-0; the specific codes help debugging.

use colored::Colorize;
use std::process::Termination;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum AuditExit {
    /// Command completed and nothing blocking was found.
    Success = 0,
    /// Blocking findings: P0 violations, architecture errors, NO-GO, non-compliant workflow.
    CheckFailed = 1,
    /// The literal command is not in the command table.
    UnknownCommand = 2,
    /// Generic error (I/O, config, malformed input).
    Error = 3,
}

impl AuditExit {
    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Maps a pass/fail outcome to `Success` or `CheckFailed`.
    #[must_use]
    pub fn from_passed(passed: bool) -> Self {
        if passed {
            Self::Success
        } else {
            Self::CheckFailed
        }
    }
}

impl Termination for AuditExit {
    fn report(self) -> std::process::ExitCode {
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        std::process::ExitCode::from(self.code() as u8)
    }
}

impl From<anyhow::Result<AuditExit>> for AuditExit {
    fn from(res: anyhow::Result<AuditExit>) -> Self {
        match res {
            Ok(code) => code,
            Err(e) => {
                eprintln!("{} {e:#}", "error:".red().bold());
                Self::Error
            }
        }
    }
}

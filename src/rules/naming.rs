// src/rules/naming.rs
//! File naming conventions for React components and hooks.

use crate::config::RuleConfig;
use crate::source::SourceFile;
use crate::types::{Severity, Violation};

/// Components must be PascalCase; hooks must start with `use`.
#[must_use]
pub fn check_naming(file: &SourceFile, _config: &RuleConfig) -> Vec<Violation> {
    let name = file.file_name();
    let mut out = Vec::new();

    if file.in_dir("components/") && name.starts_with(|c: char| c.is_ascii_lowercase()) {
        out.push(Violation::file_level(
            &file.path,
            "naming-convention",
            Severity::P1,
            "Component files should use PascalCase",
            format!("Rename to {}", capitalize(name)),
        ));
    }

    if file.in_dir("hooks/") && !name.starts_with("use") {
        out.push(Violation::file_level(
            &file.path,
            "naming-convention",
            Severity::P1,
            "Custom hook files should start with \"use\"",
            format!("Rename to use{}", capitalize(name)),
        ));
    }

    out
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

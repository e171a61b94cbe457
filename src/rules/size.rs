// src/rules/size.rs
use crate::config::RuleConfig;
use crate::source::SourceFile;
use crate::types::{Severity, Violation};

/// Flags files longer than `max_file_lines`.
#[must_use]
pub fn check_file_size(file: &SourceFile, config: &RuleConfig) -> Vec<Violation> {
    let count = file.line_count();
    if count <= config.max_file_lines {
        return Vec::new();
    }
    vec![Violation::file_level(
        &file.path,
        "file-too-long",
        Severity::P0,
        format!("File has {count} lines (limit: {})", config.max_file_lines),
        "Split it: extract hooks, child components or helpers into utils/lib",
    )]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(n: usize) -> String {
        (0..n).map(|i| format!("const v{i} = {i};\n")).collect()
    }

    #[test]
    fn at_limit_is_clean() {
        let f = SourceFile::new("src/a.ts", lines(500));
        assert!(check_file_size(&f, &RuleConfig::default()).is_empty());
    }

    #[test]
    fn one_over_limit_is_one_p0() {
        let f = SourceFile::new("src/a.ts", lines(501));
        let found = check_file_size(&f, &RuleConfig::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, "file-too-long");
        assert_eq!(found[0].severity, Severity::P0);
        assert!(found[0].message.contains("501"));
    }

    #[test]
    fn threshold_is_configurable() {
        let cfg = RuleConfig { max_file_lines: 3, ..RuleConfig::default() };
        assert_eq!(check_file_size(&SourceFile::new("a.ts", lines(4)), &cfg).len(), 1);
    }
}

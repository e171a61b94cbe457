// src/rules/duplication.rs
use std::collections::HashMap;

use crate::config::RuleConfig;
use crate::source::SourceFile;
use crate::types::{Severity, Violation};

/// Distinct blocks of `window` consecutive lines that occur more than once.
///
/// Blocks are compared after trimming the joined window; blocks shorter
/// than `min_chars` are ignored. Returned in first-occurrence order.
#[must_use]
pub fn duplicated_blocks(lines: &[&str], window: usize, min_chars: usize) -> Vec<String> {
    if window == 0 || lines.len() < window {
        return Vec::new();
    }
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    for start in 0..=lines.len() - window {
        let block = lines[start..start + window].join("\n").trim().to_string();
        if block.len() < min_chars {
            continue;
        }
        let count = counts.entry(block.clone()).or_insert(0);
        if *count == 0 {
            order.push(block);
        }
        *count += 1;
    }
    order.into_iter().filter(|b| counts.get(b).is_some_and(|c| *c > 1)).collect()
}

/// One warning per file summarising repeated blocks.
#[must_use]
pub fn check_duplication(file: &SourceFile, config: &RuleConfig) -> Vec<Violation> {
    let lines = file.line_vec();
    let dups = duplicated_blocks(&lines, config.duplication_window, config.duplication_min_chars);
    if dups.is_empty() {
        return Vec::new();
    }
    vec![Violation::file_level(
        &file.path,
        "code-duplication",
        Severity::P1,
        format!("{} duplicated code block(s) detected", dups.len()),
        "Extract the repeated code into a reusable function or component",
    )]
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK: &str = "const title = article.title.trim();\n\
                         const lead = article.lead.trim();\n\
                         const body = sanitize(article.body);\n\
                         const tags = article.tags.map(normalize);\n\
                         publish({ title, lead, body, tags });\n";

    #[test]
    fn repeated_block_is_reported_once_per_file() {
        let body = format!("{BLOCK}\n// separator\n{BLOCK}");
        let f = SourceFile::new("src/a.ts", body);
        let found = check_duplication(&f, &RuleConfig::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, "code-duplication");
        assert!(found[0].message.starts_with("1 "));
    }

    #[test]
    fn unique_content_is_clean() {
        let f = SourceFile::new("src/a.ts", BLOCK);
        assert!(check_duplication(&f, &RuleConfig::default()).is_empty());
    }

    #[test]
    fn short_blocks_are_ignored() {
        let lines = vec!["a", "b", "c", "d", "e", "a", "b", "c", "d", "e"];
        assert!(duplicated_blocks(&lines, 5, 50).is_empty());
        assert_eq!(duplicated_blocks(&lines, 5, 5).len(), 1);
    }

    #[test]
    fn fewer_lines_than_window() {
        assert!(duplicated_blocks(&["x", "y"], 5, 0).is_empty());
    }
}

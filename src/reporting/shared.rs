use std::collections::HashMap;

use crate::types::Violation;

/// Violation counts per `type`, most frequent first. Ties keep first-seen order.
pub(crate) fn type_counts(violations: &[Violation]) -> Vec<(&'static str, usize)> {
    let mut index: HashMap<&'static str, usize> = HashMap::new();
    let mut counts: Vec<(&'static str, usize)> = Vec::new();
    for v in violations {
        match index.get(v.kind) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(v.kind, counts.len());
                counts.push((v.kind, 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

pub(crate) fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

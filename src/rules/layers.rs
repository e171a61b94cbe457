// src/rules/layers.rs
//! Layer boundaries: UI components stay free of data access, utilities stay free of UI.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::RuleConfig;
use crate::source::SourceFile;
use crate::types::{Severity, Violation};

static DATA_CALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"fetch\(|axios\.|supabase\.").unwrap_or_else(|_| panic!("Invalid Regex"))
});
static COMPONENT_IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"import.*from.*components").unwrap_or_else(|_| panic!("Invalid Regex"))
});

/// Components (outside pages) calling data APIs directly.
#[must_use]
pub fn check_component_data_fetching(file: &SourceFile, _config: &RuleConfig) -> Vec<Violation> {
    if !file.in_dir("components/") || file.in_dir("pages/") {
        return Vec::new();
    }
    if !DATA_CALL_RE.is_match(&file.content) {
        return Vec::new();
    }
    vec![Violation::file_level(
        &file.path,
        "architecture-violation",
        Severity::P2,
        "Component calls an API directly",
        "Move the data access into a custom hook or a service",
    )]
}

/// Utility modules importing UI components.
#[must_use]
pub fn check_utils_import_components(file: &SourceFile, _config: &RuleConfig) -> Vec<Violation> {
    if !file.in_dir("utils/") && !file.in_dir("lib/") {
        return Vec::new();
    }
    if !COMPONENT_IMPORT_RE.is_match(&file.content) {
        return Vec::new();
    }
    vec![Violation::file_level(
        &file.path,
        "layer-violation",
        Severity::P0,
        "Utility module imports a UI component",
        "Keep utils independent of UI components",
    )]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> RuleConfig {
        RuleConfig::default()
    }

    #[test]
    fn component_fetch_is_advisory() {
        let f = SourceFile::new("components/NewsList.tsx", "const { data } = await supabase.from('news');");
        let found = check_component_data_fetching(&f, &cfg());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::P2);
    }

    #[test]
    fn pages_may_fetch() {
        let f = SourceFile::new("pages/components/Home.tsx", "fetch('/api')");
        assert!(check_component_data_fetching(&f, &cfg()).is_empty());
        let f = SourceFile::new("services/news.ts", "fetch('/api')");
        assert!(check_component_data_fetching(&f, &cfg()).is_empty());
    }

    #[test]
    fn utils_must_not_import_components() {
        let f = SourceFile::new(
            "src/utils/format.ts",
            "import { Badge } from '../components/Badge';",
        );
        let found = check_utils_import_components(&f, &cfg());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, "layer-violation");

        let ok = SourceFile::new("src/lib/date.ts", "import { format } from 'date-fns';");
        assert!(check_utils_import_components(&ok, &cfg()).is_empty());
    }
}

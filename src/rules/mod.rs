// src/rules/mod.rs
//! Lexical rule checks.
//!
//! Every rule is a pure function of one file's path and text. Agents pick
//! a registry slice and run it in order; adding a rule means adding a
//! function and listing it here.

mod duplication;
mod frontend;
mod input;
mod layers;
mod naming;
mod security;
mod size;
mod typing;

use crate::config::RuleConfig;
use crate::source::SourceFile;
use crate::types::Violation;

pub use duplication::{check_duplication, duplicated_blocks};
pub use frontend::FRONTEND_RULES;
pub use input::{check_missing_validation, check_unhandled_network};
pub use layers::{check_component_data_fetching, check_utils_import_components};
pub use naming::check_naming;
pub use security::{
    check_privileged_credential, check_public_env_secret, check_sensitive_logging,
    check_unsanitized_html,
};
pub use size::check_file_size;
pub use typing::check_untyped_any;

pub type CheckFn = fn(&SourceFile, &RuleConfig) -> Vec<Violation>;

/// A named check.
#[derive(Clone, Copy)]
pub struct Rule {
    pub id: &'static str,
    pub check: CheckFn,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("id", &self.id).finish()
    }
}

/// Checks run by the code auditor, in report order.
pub const AUDITOR_RULES: &[Rule] = &[
    Rule { id: "file-size", check: check_file_size },
    Rule { id: "untyped-any", check: check_untyped_any },
    Rule { id: "unsanitized-html", check: check_unsanitized_html },
    Rule { id: "privileged-credential", check: check_privileged_credential },
    Rule { id: "sensitive-logging", check: check_sensitive_logging },
    Rule { id: "missing-validation", check: check_missing_validation },
    Rule { id: "unhandled-network", check: check_unhandled_network },
    Rule { id: "component-data-fetching", check: check_component_data_fetching },
    Rule { id: "public-env-secret", check: check_public_env_secret },
];

/// Checks run by the security agent.
pub const SECURITY_RULES: &[Rule] = &[
    Rule { id: "unsanitized-html", check: check_unsanitized_html },
    Rule { id: "privileged-credential", check: check_privileged_credential },
    Rule { id: "sensitive-logging", check: check_sensitive_logging },
    Rule { id: "public-env-secret", check: check_public_env_secret },
    Rule { id: "missing-validation", check: check_missing_validation },
    Rule { id: "unhandled-network", check: check_unhandled_network },
];

/// Checks run by the architecture agent.
pub const ARCHITECTURE_RULES: &[Rule] = &[
    Rule { id: "file-size", check: check_file_size },
    Rule { id: "duplication", check: check_duplication },
    Rule { id: "component-data-fetching", check: check_component_data_fetching },
    Rule { id: "utils-import-components", check: check_utils_import_components },
    Rule { id: "naming", check: check_naming },
];

/// Runs `rules` over one file, concatenating results in rule order.
#[must_use]
pub fn apply(rules: &[Rule], file: &SourceFile, config: &RuleConfig) -> Vec<Violation> {
    let mut out = Vec::new();
    for rule in rules {
        let found = (rule.check)(file, config);
        if !found.is_empty() {
            tracing::debug!("{}: {} hit(s) from {}", file.path, found.len(), rule.id);
        }
        out.extend(found);
    }
    out
}

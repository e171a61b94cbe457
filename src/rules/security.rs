// src/rules/security.rs
//! Credential exposure and injection heuristics.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::RuleConfig;
use crate::source::SourceFile;
use crate::types::{Severity, Violation};

const RAW_HTML_API: &str = "dangerouslySetInnerHTML";
const SANITIZER: &str = "DOMPurify";

static SERVICE_ROLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)service_role").unwrap_or_else(|_| panic!("Invalid Regex")));
static SENSITIVE_LOG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)console\.(log|debug|info).*?(password|token|secret|key|credential)")
        .unwrap_or_else(|_| panic!("Invalid Regex"))
});
static PUBLIC_ENV_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)NEXT_PUBLIC_\w*?(SECRET|KEY|PASSWORD|TOKEN)")
        .unwrap_or_else(|_| panic!("Invalid Regex"))
});

/// Raw HTML injection with no sanitizer referenced anywhere in the file.
#[must_use]
pub fn check_unsanitized_html(file: &SourceFile, _config: &RuleConfig) -> Vec<Violation> {
    if !file.content.contains(RAW_HTML_API) || file.content.contains(SANITIZER) {
        return Vec::new();
    }
    vec![Violation::file_level(
        &file.path,
        "xss-vulnerability",
        Severity::P0,
        "dangerouslySetInnerHTML without sanitization",
        "Pass the HTML through DOMPurify.sanitize() before rendering",
    )]
}

/// Service-role credentials referenced outside server-only code.
#[must_use]
pub fn check_privileged_credential(file: &SourceFile, _config: &RuleConfig) -> Vec<Violation> {
    if file.path.contains("server") || !SERVICE_ROLE_RE.is_match(&file.content) {
        return Vec::new();
    }
    vec![Violation::file_level(
        &file.path,
        "security-critical",
        Severity::P0,
        "service_role key referenced in client code (never ship it to the browser)",
        "Move it to a server-side environment variable or use the anon key",
    )]
}

/// Log statements whose line mentions a sensitive field.
#[must_use]
pub fn check_sensitive_logging(file: &SourceFile, _config: &RuleConfig) -> Vec<Violation> {
    file.lines()
        .enumerate()
        .filter(|(_, line)| SENSITIVE_LOG_RE.is_match(line))
        .map(|(idx, _)| {
            Violation::at_line(
                &file.path,
                idx + 1,
                "security-leak",
                Severity::P0,
                "console output includes sensitive data",
                "Remove the log or mask the value",
            )
        })
        .collect()
}

/// Publicly exposed env vars with secret-sounding names.
#[must_use]
pub fn check_public_env_secret(file: &SourceFile, _config: &RuleConfig) -> Vec<Violation> {
    let Some(found) = PUBLIC_ENV_RE.find(&file.content) else {
        return Vec::new();
    };
    vec![Violation::file_level(
        &file.path,
        "security-critical",
        Severity::P0,
        format!("Sensitive variable exposed through NEXT_PUBLIC_ ({})", found.as_str()),
        "Drop the NEXT_PUBLIC_ prefix and read it server-side only",
    )]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, body: &str) -> SourceFile {
        SourceFile::new(path, body)
    }

    fn cfg() -> RuleConfig {
        RuleConfig::default()
    }

    #[test]
    fn raw_html_needs_sanitizer() {
        let bad = file("src/Post.tsx", "<div dangerouslySetInnerHTML={{ __html: body }} />");
        let found = check_unsanitized_html(&bad, &cfg());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, "xss-vulnerability");

        let ok = file(
            "src/Post.tsx",
            "import DOMPurify from 'dompurify';\n<div dangerouslySetInnerHTML={{ __html: DOMPurify.sanitize(body) }} />",
        );
        assert!(check_unsanitized_html(&ok, &cfg()).is_empty());
    }

    #[test]
    fn service_role_allowed_only_in_server_paths() {
        let body = "const key = process.env.SUPABASE_SERVICE_ROLE_KEY;";
        assert_eq!(check_privileged_credential(&file("src/lib/db.ts", body), &cfg()).len(), 1);
        assert!(check_privileged_credential(&file("src/server/db.ts", body), &cfg()).is_empty());
    }

    #[test]
    fn sensitive_logging_is_line_scoped() {
        let body = "console.log('user', user);\nconsole.debug('token', t);\nlog(password);\n";
        let found = check_sensitive_logging(&file("src/a.ts", body), &cfg());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, Some(2));
        assert_eq!(found[0].severity, Severity::P0);
    }

    #[test]
    fn public_secret_env_vars() {
        let bad = file("src/a.ts", "const s = process.env.NEXT_PUBLIC_STRIPE_SECRET;");
        let found = check_public_env_secret(&bad, &cfg());
        assert_eq!(found.len(), 1);
        assert!(found[0].message.contains("NEXT_PUBLIC_STRIPE_SECRET"));

        let ok = file("src/a.ts", "const u = process.env.NEXT_PUBLIC_SITE_URL;");
        assert!(check_public_env_secret(&ok, &cfg()).is_empty());
    }

    #[test]
    fn public_secret_match_ignores_case() {
        let bad = file("src/maps.ts", "const k = process.env.NEXT_PUBLIC_apiKey;");
        let found = check_public_env_secret(&bad, &cfg());
        assert_eq!(found.len(), 1);
        assert!(found[0].message.contains("NEXT_PUBLIC_apiKey"));
    }
}

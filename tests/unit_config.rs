// tests/unit_config.rs
use portal_audit::config::{AuditConfig, RuleConfig, CONFIG_FILE};
use portal_audit::retry::RetryOptions;
use std::fs;
use std::time::Duration;

#[test]
fn test_load_toml() {
    let d = tempfile::tempdir().unwrap();
    fs::write(
        d.path().join(CONFIG_FILE),
        "[rules]\nmax_file_lines = 300\n\n[scan]\nextensions = [\"ts\"]\n",
    )
    .unwrap();
    let c = AuditConfig::load(d.path()).unwrap();
    assert_eq!(c.rules.max_file_lines, 300);
    assert_eq!(c.rules.duplication_window, 5);
    assert_eq!(c.scan.extensions, vec!["ts"]);
}

#[test]
fn test_missing_file_gives_defaults() {
    let d = tempfile::tempdir().unwrap();
    let c = AuditConfig::load(d.path()).unwrap();
    assert_eq!(c.rules.max_file_lines, RuleConfig::default().max_file_lines);
    assert_eq!(c.cache.default_ttl_ms, 300_000);
}

#[test]
fn test_invalid_values_rejected() {
    let d = tempfile::tempdir().unwrap();
    fs::write(d.path().join(CONFIG_FILE), "[retry]\nbackoff_multiplier = 0.5\n").unwrap();
    let err = AuditConfig::load(d.path()).unwrap_err();
    assert!(err.to_string().contains("backoff_multiplier"));
}

#[test]
fn test_retry_section_feeds_options() {
    let c = AuditConfig::parse(
        "[retry]\nmax_retries = 5\ninitial_delay_ms = 250\nretryable_errors = []\n",
    )
    .unwrap();
    let opts = RetryOptions::from(&c.retry);
    assert_eq!(opts.max_retries, 5);
    assert_eq!(opts.initial_delay, Duration::from_millis(250));
    assert_eq!(opts.max_delay, Duration::from_millis(10_000));
    assert!(opts.retryable_errors.is_empty());
}

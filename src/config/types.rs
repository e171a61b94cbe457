use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{DEFAULT_MAX_FILE_LINES, EXCLUDE_DIRS, SOURCE_EXTENSIONS};

/// Root of `portal-audit.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default)]
    pub rules: RuleConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub quality: QualityConfig,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub cache: CacheSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(default = "default_max_lines")]
    pub max_file_lines: usize,
    #[serde(default = "default_dup_window")]
    pub duplication_window: usize,
    #[serde(default = "default_dup_min_chars")]
    pub duplication_min_chars: usize,
    #[serde(default = "default_lookahead")]
    pub error_handling_lookahead: usize,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            max_file_lines: default_max_lines(),
            duplication_window: default_dup_window(),
            duplication_min_chars: default_dup_min_chars(),
            error_handling_lookahead: default_lookahead(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            exclude_dirs: default_exclude_dirs(),
            extensions: default_extensions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_report_path")]
    pub path: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { path: default_report_path() }
    }
}

/// One external quality tool.
///
/// `script` names the manifest `scripts` entry whose presence enables the
/// tool; without it the tool is always attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    pub command: String,
    #[serde(default)]
    pub script: Option<String>,
}

impl ToolCommand {
    fn new(command: &str, script: Option<&str>) -> Self {
        Self {
            command: command.to_string(),
            script: script.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,
    #[serde(default = "default_lint")]
    pub lint: ToolCommand,
    #[serde(default = "default_typecheck")]
    pub typecheck: ToolCommand,
    #[serde(default = "default_build")]
    pub build: ToolCommand,
    #[serde(default = "default_test")]
    pub test: ToolCommand,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_tool_timeout(),
            manifest: default_manifest(),
            lint: default_lint(),
            typecheck: default_typecheck(),
            build: default_build(),
            test: default_test(),
        }
    }
}

/// File-level retry settings, converted into [`crate::retry::RetryOptions`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
    #[serde(default = "default_multiplier")]
    pub backoff_multiplier: f64,
    #[serde(default = "default_retryable")]
    pub retryable_errors: Vec<String>,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            backoff_multiplier: default_multiplier(),
            retryable_errors: default_retryable(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_ttl")]
    pub default_ttl_ms: u64,
    #[serde(default = "default_cache_size")]
    pub max_size: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            default_ttl_ms: default_ttl(),
            max_size: default_cache_size(),
        }
    }
}

const fn default_max_lines() -> usize { DEFAULT_MAX_FILE_LINES }
const fn default_dup_window() -> usize { 5 }
const fn default_dup_min_chars() -> usize { 50 }
const fn default_lookahead() -> usize { 10 }
const fn default_tool_timeout() -> u64 { 600 }
const fn default_max_retries() -> u32 { 3 }
const fn default_initial_delay() -> u64 { 1000 }
const fn default_max_delay() -> u64 { 10_000 }
const fn default_multiplier() -> f64 { 2.0 }
const fn default_ttl() -> u64 { 300_000 }
const fn default_cache_size() -> usize { 1000 }

fn default_exclude_dirs() -> Vec<String> {
    EXCLUDE_DIRS.iter().map(|s| (*s).to_string()).collect()
}
fn default_extensions() -> Vec<String> {
    SOURCE_EXTENSIONS.iter().map(|s| (*s).to_string()).collect()
}
fn default_report_path() -> PathBuf { PathBuf::from("docs/AUDIT_REPORT.md") }
fn default_manifest() -> PathBuf { PathBuf::from("package.json") }
fn default_lint() -> ToolCommand { ToolCommand::new("npm run lint", Some("lint")) }
fn default_typecheck() -> ToolCommand { ToolCommand::new("npx tsc --noEmit", None) }
fn default_build() -> ToolCommand { ToolCommand::new("npm run build", Some("build")) }
fn default_test() -> ToolCommand {
    ToolCommand::new("npm run test -- --passWithNoTests", Some("test"))
}
fn default_retryable() -> Vec<String> {
    ["ETIMEDOUT", "ECONNRESET", "ENOTFOUND"].iter().map(|s| (*s).to_string()).collect()
}

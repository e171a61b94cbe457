// src/config/mod.rs
mod types;

pub use self::types::{
    AuditConfig, CacheSettings, QualityConfig, ReportConfig, RetrySettings, RuleConfig,
    ScanConfig, ToolCommand,
};

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{AuditError, Result};

/// Name of the per-project configuration file.
pub const CONFIG_FILE: &str = "portal-audit.toml";

impl AuditConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `portal-audit.toml` from `root`, falling back to defaults when absent.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content).map_err(|message| AuditError::Config {
                path: path.clone(),
                message,
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("no {CONFIG_FILE} in {}, using defaults", root.display());
                Ok(Self::default())
            }
            Err(e) => Err(AuditError::io(e, path)),
        }
    }

    /// Parses TOML content into a config.
    ///
    /// # Errors
    /// Returns the parser message on malformed TOML or invalid values.
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        let config: Self = toml::from_str(content).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.rules.duplication_window == 0 {
            return Err("rules.duplication_window must be at least 1".into());
        }
        if self.rules.error_handling_lookahead == 0 {
            return Err("rules.error_handling_lookahead must be at least 1".into());
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err("retry.backoff_multiplier must be >= 1".into());
        }
        if self.cache.max_size == 0 {
            return Err("cache.max_size must be at least 1".into());
        }
        Ok(())
    }
}

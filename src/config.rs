//! Configuration loading
//!
//! Configuration is read from a TOML file. Every key is optional:
//!
//! ```toml
//! idle_threshold_sec = 15.0
//! file_extension = "txt"
//! failure_policy = "skip"
//!
//! [logging]
//! level = "debug"
//! ```

use crate::error::{AssayError, Result};
use crate::types::DEFAULT_IDLE_THRESHOLD_SEC;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What a batch load does when one trial fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop at the first failing trial (in path order)
    #[default]
    Abort,
    /// Record the failure and keep loading
    Skip,
}

/// Main configuration struct
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssayConfig {
    /// Gaps between bouts longer than this are idle time
    #[serde(default = "default_idle_threshold")]
    pub idle_threshold_sec: f64,

    /// Extension of bout log files in an experiment folder
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `tape_assay=debug`
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_idle_threshold() -> f64 {
    DEFAULT_IDLE_THRESHOLD_SEC
}

fn default_file_extension() -> String {
    "txt".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AssayConfig {
    fn default() -> Self {
        Self {
            idle_threshold_sec: default_idle_threshold(),
            file_extension: default_file_extension(),
            failure_policy: FailurePolicy::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AssayConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AssayConfig =
            toml::from_str(text).map_err(|e| AssayError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AssayError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.idle_threshold_sec.is_finite() || self.idle_threshold_sec <= 0.0 {
            return Err(AssayError::Config(format!(
                "idle_threshold_sec must be positive, got {}",
                self.idle_threshold_sec
            )));
        }
        if self.file_extension.is_empty() {
            return Err(AssayError::Config("file_extension is empty".to_string()));
        }
        Ok(())
    }
}

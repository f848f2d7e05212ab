//! Scan executor configuration
//!
//! Loaded from JSON; every field has a default so an empty object is valid.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{ExecutorError, ExecutorResult};

/// Executor tuning shared by every scan of a partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Candidate rows per invocation for suspendable plans that carry no
    /// threshold of their own (default: 5000)
    #[serde(default = "default_suspend_threshold")]
    pub default_suspend_threshold: i64,

    /// Initial capacity of the search-key buffer (default: 4)
    #[serde(default = "default_key_buffer_capacity")]
    pub key_buffer_capacity: usize,

    /// Log filter used when `RUST_LOG` is unset (default: "warn")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_suspend_threshold() -> i64 {
    5000
}

fn default_key_buffer_capacity() -> usize {
    4
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            default_suspend_threshold: default_suspend_threshold(),
            key_buffer_capacity: default_key_buffer_capacity(),
            log_level: default_log_level(),
        }
    }
}

impl ScanConfig {
    /// Create a config with a specific default threshold
    pub fn with_suspend_threshold(threshold: i64) -> Self {
        Self {
            default_suspend_threshold: threshold,
            ..Default::default()
        }
    }

    /// Parse and validate a JSON config
    pub fn from_json(text: &str) -> ExecutorResult<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| ExecutorError::config_invalid(format!("malformed config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: &Path) -> ExecutorResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            ExecutorError::config_invalid(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ExecutorResult<()> {
        if self.default_suspend_threshold <= 0 {
            return Err(ExecutorError::config_invalid(format!(
                "default_suspend_threshold must be positive, got {}",
                self.default_suspend_threshold
            )));
        }
        if self.log_level.trim().is_empty() {
            return Err(ExecutorError::config_invalid("log_level is empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScanConfig::default();
        assert_eq!(config.default_suspend_threshold, 5000);
        assert_eq!(config.key_buffer_capacity, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_object_uses_defaults() {
        assert_eq!(ScanConfig::from_json("{}").unwrap(), ScanConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = ScanConfig::from_json(r#"{"default_suspend_threshold": 10}"#).unwrap();
        assert_eq!(config.default_suspend_threshold, 10);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_non_positive_threshold_rejected() {
        let err = ScanConfig::with_suspend_threshold(0).validate().unwrap_err();
        assert!(err.is_rejection());
        assert!(ScanConfig::from_json(r#"{"default_suspend_threshold": -3}"#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        fs::write(&path, r#"{"key_buffer_capacity": 16}"#).unwrap();
        assert_eq!(ScanConfig::load(&path).unwrap().key_buffer_capacity, 16);
        assert!(ScanConfig::load(&dir.path().join("missing.json")).is_err());
    }
}

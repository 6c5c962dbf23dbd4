//! Configuration Management
//!
//! Handles persistent configuration storage for toci.

use crate::oci::auth;
use crate::oci::http::RetryPolicy;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_MAX_ERROR_RETRY_ATTEMPTS: u32 = 9;
const DEFAULT_MIN_ERROR_RETRY_DELAY_MS: u64 = 25;
const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// User configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// OCI config-file profile
    #[serde(default)]
    pub profile: Option<String>,
    /// Path of the OCI config file
    #[serde(default)]
    pub config_file: Option<PathBuf>,
    /// Regions to query; `*` means all subscribed regions
    #[serde(default)]
    pub regions: Vec<String>,
    /// Compartments to query; empty means the whole tenancy
    #[serde(default)]
    pub compartments: Vec<String>,
    #[serde(default = "default_max_error_retry_attempts")]
    pub max_error_retry_attempts: u32,
    #[serde(default = "default_min_error_retry_delay_ms")]
    pub min_error_retry_delay_ms: u64,
    /// Scopes queried at the same time
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_max_error_retry_attempts() -> u32 {
    DEFAULT_MAX_ERROR_RETRY_ATTEMPTS
}

fn default_min_error_retry_delay_ms() -> u64 {
    DEFAULT_MIN_ERROR_RETRY_DELAY_MS
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: None,
            config_file: None,
            regions: Vec::new(),
            compartments: Vec::new(),
            max_error_retry_attempts: DEFAULT_MAX_ERROR_RETRY_ATTEMPTS,
            min_error_retry_delay_ms: DEFAULT_MIN_ERROR_RETRY_DELAY_MS,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("toci").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(_) => Self::default(),
        }
    }

    /// Parse configuration, falling back to defaults on malformed content
    pub fn parse(content: &str) -> Self {
        serde_json::from_str(content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed config: {}", e);
            Self::default()
        })
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Get effective profile (CLI > config > OCI_CLI_PROFILE > DEFAULT)
    pub fn effective_profile(&self) -> String {
        self.profile
            .clone()
            .unwrap_or_else(auth::default_profile_name)
    }

    /// Get effective OCI config file (CLI > config > OCI_CONFIG_FILE > ~/.oci/config)
    pub fn effective_config_file(&self) -> Option<PathBuf> {
        self.config_file.clone().or_else(auth::default_config_path)
    }

    /// Retry policy for API calls
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_error_retry_attempts,
            min_delay: Duration::from_millis(self.min_error_retry_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = Config::parse(r#"{"profile": "PROD", "regions": ["*"]}"#);
        assert_eq!(config.profile.as_deref(), Some("PROD"));
        assert_eq!(config.regions, vec!["*"]);
        assert_eq!(config.max_error_retry_attempts, 9);
        assert_eq!(config.min_error_retry_delay_ms, 25);
        assert_eq!(config.max_concurrency, 10);
    }

    #[test]
    fn test_malformed_config_falls_back() {
        assert_eq!(Config::parse("{not json"), Config::default());
    }

    #[test]
    fn test_retry_policy() {
        let config = Config {
            max_error_retry_attempts: 0,
            min_error_retry_delay_ms: 100,
            ..Default::default()
        };
        let retry = config.retry_policy();
        assert_eq!(retry.max_attempts, 0);
        assert_eq!(retry.min_delay, Duration::from_millis(100));
    }

    #[test]
    fn test_explicit_profile_wins() {
        let config = Config {
            profile: Some("ADMIN".to_string()),
            ..Default::default()
        };
        assert_eq!(config.effective_profile(), "ADMIN");
    }
}

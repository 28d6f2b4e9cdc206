//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the backend base URL, the envelope success code, the request timeout and
//! the last used username.
//!
//! Configuration is stored at `~/.config/certiam/config.json`. The
//! `CERTIAM_BASE_URL`, `CERTIAM_SUCCESS_CODE` and `CERTIAM_TIMEOUT_SECS`
//! environment variables override the stored values.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::pipeline::{PipelineOptions, SUCCESS_CODE};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "certiam";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend used when nothing is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

pub const ENV_BASE_URL: &str = "CERTIAM_BASE_URL";
pub const ENV_SUCCESS_CODE: &str = "CERTIAM_SUCCESS_CODE";
pub const ENV_TIMEOUT_SECS: &str = "CERTIAM_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub success_code: i64,
    pub request_timeout_secs: u64,
    pub transform_request_data: bool,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            success_code: SUCCESS_CODE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            transform_request_data: true,
            last_username: None,
        }
    }
}

impl Config {
    /// Load the stored config (or defaults) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply overrides from a variable lookup. Unparseable numbers are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|u| !u.is_empty()) {
            self.base_url = url;
        }
        if let Some(code) = lookup(ENV_SUCCESS_CODE) {
            match code.parse() {
                Ok(code) => self.success_code = code,
                Err(_) => warn!(value = %code, "Ignoring invalid {}", ENV_SUCCESS_CODE),
            }
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            match secs.parse() {
                Ok(secs) => self.request_timeout_secs = secs,
                Err(_) => warn!(value = %secs, "Ignoring invalid {}", ENV_TIMEOUT_SECS),
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            success_code: self.success_code,
            transform_request_data: self.transform_request_data,
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.success_code, 0);
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
        assert!(config.transform_request_data);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"base_url": "https://pki.example.com"}"#)
            .expect("partial config should parse");
        assert_eq!(config.base_url, "https://pki.example.com");
        assert_eq!(config.request_timeout_secs, 60);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_BASE_URL, "https://iam.internal"),
            (ENV_SUCCESS_CODE, "200"),
            (ENV_TIMEOUT_SECS, "soon"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.base_url, "https://iam.internal");
        assert_eq!(config.success_code, 200);
        assert_eq!(config.request_timeout_secs, 60);
        assert_eq!(config.pipeline_options().success_code, 200);
    }
}

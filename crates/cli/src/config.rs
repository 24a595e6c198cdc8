//! Configuration management for the CLI
//!
//! Settings are layered from `~/.config/hview/config.json` and `HVIEW_*`
//! environment variables. Command-line flags take precedence over both.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use view_lib::view::ControllerConfig;

use crate::output::OutputFormat;

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// API endpoint URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries after a failed or timed-out request
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Metric used by the capacity view when none is given
    #[serde(default = "default_metric")]
    pub default_metric: String,

    /// Default output format (`table` or `json`)
    #[serde(default)]
    pub default_format: Option<String>,

    /// Currency code for cost columns
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_api_url() -> String {
    "http://localhost:3030".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_metric() -> String {
    "cpu".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            default_metric: default_metric(),
            default_format: None,
            currency: default_currency(),
        }
    }
}

impl CliConfig {
    /// Load configuration from the default file and environment
    pub fn load() -> Result<Self> {
        let path = Self::config_path().ok();
        Self::load_from(path.as_deref())
    }

    /// Load configuration from an optional file and the environment
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Json)
                    .required(false),
            );
        }

        let settings = builder
            .add_source(config::Environment::with_prefix("HVIEW").try_parsing(true))
            .build()
            .context("Failed to load configuration")?;

        settings
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("hview").join("config.json"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Retry policy for snapshot fetches
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            request_timeout: self.timeout(),
            max_retries: self.max_retries,
            ..Default::default()
        }
    }

    /// Configured default output format, if valid
    pub fn output_format(&self) -> Option<OutputFormat> {
        self.default_format
            .as_deref()
            .and_then(|f| OutputFormat::from_str(f, true).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = CliConfig::load_from(Some(Path::new("/nonexistent/hview.json"))).unwrap();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.default_metric, "cpu");
        assert_eq!(config.currency, "USD");
    }

    #[test]
    fn test_file_values_override_defaults() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        write!(
            file,
            r#"{{"timeout_secs": 5, "max_retries": 0,
                "default_format": "json", "default_metric": "memory"}}"#
        )
        .unwrap();

        let config = CliConfig::load_from(Some(file.path())).unwrap();

        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.controller_config().max_retries, 0);
        assert_eq!(config.default_metric, "memory");
        assert!(matches!(config.output_format(), Some(OutputFormat::Json)));
    }

    #[test]
    fn test_unknown_format_is_ignored() {
        let config = CliConfig {
            default_format: Some("yaml".to_string()),
            ..Default::default()
        };
        assert!(config.output_format().is_none());
    }
}

//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/reelstats/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/reelstats/` (~/.config/reelstats/)
//! - State/Logs: `$XDG_STATE_HOME/reelstats/` (~/.local/state/reelstats/)

use crate::analytics::EarningsAssumptions;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Longest accepted trending lookback, one hundred years
pub const MAX_TRENDING_WINDOW_DAYS: u32 = 36_500;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Analytics defaults (overridable per CLI invocation)
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Earnings model assumptions, each a `[low, mid, high]` triple
    #[serde(default)]
    pub earnings: EarningsAssumptions,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Defaults for the analytics components
#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    /// IANA timezone used to bucket posting times
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Analysis window reported by the posting-time optimizer
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    /// Minimum number of videos a hashtag needs before it is scored
    #[serde(default = "default_min_hashtag_uses")]
    pub min_hashtag_uses: usize,

    /// Lookback used when ranking trending sounds
    #[serde(default = "default_trending_window_days")]
    pub trending_window_days: u32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            window_days: default_window_days(),
            min_hashtag_uses: default_min_hashtag_uses(),
            trending_window_days: default_trending_window_days(),
        }
    }
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_window_days() -> u32 {
    60
}

fn default_min_hashtag_uses() -> usize {
    5
}

fn default_trending_window_days() -> u32 {
    30
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.analytics.min_hashtag_uses == 0 {
            return Err(Error::Config(
                "analytics.min_hashtag_uses must be at least 1".to_string(),
            ));
        }
        if !(1..=MAX_TRENDING_WINDOW_DAYS).contains(&self.analytics.trending_window_days) {
            return Err(Error::Config(format!(
                "analytics.trending_window_days must be between 1 and {}",
                MAX_TRENDING_WINDOW_DAYS
            )));
        }
        if self.analytics.timezone.trim().is_empty() {
            return Err(Error::Config(
                "analytics.timezone must not be empty".to_string(),
            ));
        }
        if let Some(key) = self.earnings.invalid_key() {
            return Err(Error::Config(format!(
                "earnings.{} must hold three finite, non-negative numbers",
                key
            )));
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/reelstats/config.toml` (~/.config/reelstats/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("reelstats").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/reelstats/` (~/.local/state/reelstats/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("reelstats")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/reelstats/reelstats.log` (~/.local/state/reelstats/reelstats.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("reelstats.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.analytics.timezone, "UTC");
        assert_eq!(config.analytics.window_days, 60);
        assert_eq!(config.analytics.min_hashtag_uses, 5);
        assert_eq!(config.analytics.trending_window_days, 30);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[analytics]
timezone = "America/New_York"
min_hashtag_uses = 2

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.analytics.timezone, "America/New_York");
        assert_eq!(config.analytics.min_hashtag_uses, 2);
        // Unspecified keys fall back to defaults
        assert_eq!(config.analytics.window_days, 60);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.max_files, 5);
    }

    #[test]
    fn test_validation_rejects_zero_thresholds() {
        let mut config = Config::default();
        config.analytics.min_hashtag_uses = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.analytics.trending_window_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_bounds_trending_window() {
        let mut config = Config::default();
        config.analytics.trending_window_days = MAX_TRENDING_WINDOW_DAYS;
        assert!(config.validate().is_ok());

        config.analytics.trending_window_days = 200_000_000;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_parse_earnings_table() {
        let toml = r#"
[earnings]
brand_cpm_per_view = [0.01, 0.02, 0.03]
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.earnings.brand_cpm_per_view.mid, 0.02);
        // Other assumptions keep their defaults
        assert_eq!(config.earnings.merch_aov.high, 70.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_negative_earnings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[earnings]
merch_margin = [-0.1, 0.4, 0.5]
").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("earnings.merch_margin"));

        // A triple of the wrong length is a parse error
        std::fs::write(&path, "[earnings]
merch_aov = [10, 20]
").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[analytics]\nwindow_days = 14\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.analytics.window_days, 14);

        std::fs::write(&path, "[analytics]\nmin_hashtag_uses = 0\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_log_path() {
        assert!(Config::log_path().ends_with("reelstats/reelstats.log"));
    }
}

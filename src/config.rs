//! Configuration loading and persistence.
//!
//! The configuration lives in a single TOML file. A missing file is
//! replaced with documented defaults, a malformed file falls back to
//! defaults that are written back to disk so the process always starts.

use std::fs;
use std::path::Path;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, Result};

/// Placeholder credentials shipped in the default config. Telegram is
/// force-disabled while these are still in place.
pub const PLACEHOLDER_BOT_TOKEN: &str = "your_bot_token_here";
pub const PLACEHOLDER_CHAT_ID: &str = "your_chat_id_here";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub monitoring: MonitoringConfig,
    pub notifications: NotificationsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter: "error", "warn", "info", "debug" or "trace".
    /// RUST_LOG takes precedence when set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Seconds between two sampling ticks
    pub check_interval_seconds: u64,
    /// Minimum seconds between two notifications for the same
    /// (resource, level) pair
    pub notification_cooldown_seconds: u64,
    pub resources: ResourcesConfig,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            check_interval_seconds: 60,
            notification_cooldown_seconds: 300,
            resources: ResourcesConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcesConfig {
    pub cpu: ResourceConfig,
    pub memory: ResourceConfig,
    pub disk: DiskConfig,
    pub network: NetworkConfig,
}

/// Threshold settings for a single percentage-based resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    pub enabled: bool,
    /// Usage percentage above which an alert fires (strict greater-than)
    pub threshold: f64,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 80.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskConfig {
    pub enabled: bool,
    pub threshold: f64,
    /// Mount points to watch. An empty list means every mounted filesystem.
    pub paths: Vec<String>,
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 80.0,
            paths: vec!["/".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub enabled: bool,
    /// Outbound throughput threshold in MB/s
    pub threshold_sent_mbps: f64,
    /// Inbound throughput threshold in MB/s
    pub threshold_recv_mbps: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_sent_mbps: 10.0,
            threshold_recv_mbps: 10.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub enabled: bool,
    pub bot_token: String,
    pub chat_id: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bot_token: PLACEHOLDER_BOT_TOKEN.into(),
            chat_id: PLACEHOLDER_CHAT_ID.into(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// A missing file is created with defaults. A file that cannot be read
    /// or parsed falls back to defaults which are written back to disk.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!(
                "Config file {} not found, creating defaults",
                path.display()
            );
            let config = Config::default();
            if let Err(e) = config.save(path) {
                error!("Failed to write default config: {e}");
            }
            return config;
        }

        let mut config = match fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<Config>(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!(
                        "Config file {} is malformed, using defaults: {e}",
                        path.display()
                    );
                    let config = Config::default();
                    if let Err(e) = config.save(path) {
                        error!("Failed to write default config: {e}");
                    }
                    config
                }
            },
            Err(e) => {
                warn!("Cannot read config file {}: {e}", path.display());
                Config::default()
            }
        };

        config.sanitize_telegram();
        config
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| MonitorError::config(format!("Failed to serialize config: {e}")))?;
        fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());

        Ok(())
    }

    /// Log level from the `[logging]` section, falling back to Info.
    pub fn log_level(&self) -> log::LevelFilter {
        self.logging
            .level
            .parse()
            .unwrap_or(log::LevelFilter::Info)
    }

    /// Disable Telegram when its credentials are missing or still set to
    /// the shipped placeholders.
    fn sanitize_telegram(&mut self) {
        let telegram = &mut self.notifications.telegram;
        if !telegram.enabled {
            return;
        }

        if telegram.bot_token.is_empty() || telegram.bot_token == PLACEHOLDER_BOT_TOKEN {
            warn!("Telegram bot token is not configured, disabling notifications");
            telegram.enabled = false;
        }

        if telegram.chat_id.is_empty() || telegram.chat_id == PLACEHOLDER_CHAT_ID {
            warn!("Telegram chat ID is not configured, disabling notifications");
            telegram.enabled = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.monitoring.check_interval_seconds, 60);
        assert_eq!(config.monitoring.notification_cooldown_seconds, 300);
        assert_eq!(config.monitoring.resources.cpu.threshold, 80.0);
        assert_eq!(config.monitoring.resources.disk.paths, vec!["/".to_string()]);
        assert_eq!(config.monitoring.resources.network.threshold_sent_mbps, 10.0);
        assert!(config.notifications.telegram.enabled);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let partial = r#"
[monitoring]
check_interval_seconds = 5

[monitoring.resources.cpu]
threshold = 50.0
"#;
        let config: Config = toml::from_str(partial).unwrap();
        assert_eq!(config.monitoring.check_interval_seconds, 5);
        assert_eq!(config.monitoring.resources.cpu.threshold, 50.0);
        // Untouched sections keep their defaults
        assert_eq!(config.monitoring.notification_cooldown_seconds, 300);
        assert_eq!(config.monitoring.resources.memory.threshold, 80.0);
        assert!(config.monitoring.resources.network.enabled);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(
            parsed.monitoring.check_interval_seconds,
            config.monitoring.check_interval_seconds
        );
        assert_eq!(
            parsed.monitoring.resources.disk.paths,
            config.monitoring.resources.disk.paths
        );
    }

    #[test]
    fn test_placeholder_credentials_disable_telegram() {
        let mut config = Config::default();
        config.sanitize_telegram();
        assert!(!config.notifications.telegram.enabled);

        let mut config = Config::default();
        config.notifications.telegram.bot_token = "123456:real-token".into();
        config.notifications.telegram.chat_id = "99887766".into();
        config.sanitize_telegram();
        assert!(config.notifications.telegram.enabled);
    }

    #[test]
    fn test_log_level_parsing() {
        let mut config = Config::default();
        assert_eq!(config.log_level(), log::LevelFilter::Info);

        config.logging.level = "debug".into();
        assert_eq!(config.log_level(), log::LevelFilter::Debug);

        config.logging.level = "not-a-level".into();
        assert_eq!(config.log_level(), log::LevelFilter::Info);
    }
}

//! Tannoy configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TannoyConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
}

impl Default for TannoyConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            gateway: GatewayConfig::default(),
            channel: ChannelConfig::default(),
        }
    }
}

impl TannoyConfig {
    /// Load config from the default path (~/.tannoy/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::TannoyError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| crate::error::TannoyError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the Tannoy home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tannoy")
    }
}

/// Engine loop and persistence knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds between queue drains.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_tick_interval() -> u64 { 5 }
fn default_db_path() -> String { "~/.tannoy/tannoy.db".into() }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval(),
            db_path: default_db_path(),
        }
    }
}

/// Gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 { 8787 }
fn default_host() -> String { "127.0.0.1".into() }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// Channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelConfig {
    #[serde(default)]
    pub telegram: Option<TelegramChannelConfig>,
    #[serde(default)]
    pub discord: Option<DiscordChannelConfig>,
    #[serde(default)]
    pub slack: Option<SlackChannelConfig>,
}

/// Telegram channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramChannelConfig {
    pub enabled: bool,
    pub bot_token: String,
    /// Default chat for notifications; rule actions may override it.
    pub chat_id: String,
}

/// Discord channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordChannelConfig {
    pub enabled: bool,
    pub webhook_url: String,
}

/// Slack channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackChannelConfig {
    pub enabled: bool,
    pub webhook_url: String,
    #[serde(default)]
    pub channel: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TannoyConfig::default();
        assert_eq!(config.engine.tick_interval_secs, 5);
        assert_eq!(config.gateway.port, 8787);
        assert!(config.channel.telegram.is_none());
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            [engine]
            tick_interval_secs = 2
            db_path = "/tmp/tannoy-test.db"

            [channel.telegram]
            enabled = true
            bot_token = "123:abc"
            chat_id = "-100200300"
        "#;

        let config: TannoyConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.engine.tick_interval_secs, 2);
        assert_eq!(config.engine.db_path, "/tmp/tannoy-test.db");
        let telegram = config.channel.telegram.unwrap();
        assert!(telegram.enabled);
        assert_eq!(telegram.chat_id, "-100200300");
    }

    #[test]
    fn test_config_missing_fields_use_defaults() {
        let toml_str = "";
        let config: TannoyConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.gateway.host, "127.0.0.1");
        assert_eq!(config.engine.db_path, "~/.tannoy/tannoy.db");
    }

    #[test]
    fn test_home_dir() {
        let home = TannoyConfig::home_dir();
        assert!(home.to_string_lossy().contains("tannoy"));
    }
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_CHECKPOINT_INTERVAL_SECS, DEFAULT_CONNECTION_TIMEOUT_SECS,
    DEFAULT_RESUME_LOOKUP_TIMEOUT_SECS, DEFAULT_RESUME_THRESHOLD_SECS,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub network: NetworkConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval_secs: u64,

    #[serde(default = "default_resume_threshold")]
    pub resume_threshold_secs: u64,

    #[serde(default = "default_resume_lookup_timeout")]
    pub resume_lookup_timeout_secs: u64,

    #[serde(default = "default_true")]
    pub auto_fullscreen: bool,

    #[serde(default = "default_true")]
    pub lock_orientation_in_fullscreen: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout")]
    pub connection_timeout: u64,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            info!("No config file found, using defaults");
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", path);
        let contents = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;
        info!("Config loaded successfully");
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents).context("Failed to write config file")?;

        debug!("Config saved to {:?}", path);
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("cinetrack").join("config.toml"))
    }
}

impl PlaybackConfig {
    pub fn checkpoint_interval(&self) -> Duration {
        // A zero period would make the interval timer panic.
        Duration::from_secs(self.checkpoint_interval_secs.max(1))
    }

    pub fn resume_lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.resume_lookup_timeout_secs)
    }
}

impl NetworkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            checkpoint_interval_secs: default_checkpoint_interval(),
            resume_threshold_secs: default_resume_threshold(),
            resume_lookup_timeout_secs: default_resume_lookup_timeout(),
            auto_fullscreen: default_true(),
            lock_orientation_in_fullscreen: default_true(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connection_timeout: default_timeout(),
        }
    }
}

// Default value functions
fn default_checkpoint_interval() -> u64 {
    DEFAULT_CHECKPOINT_INTERVAL_SECS
}
fn default_resume_threshold() -> u64 {
    DEFAULT_RESUME_THRESHOLD_SECS
}
fn default_resume_lookup_timeout() -> u64 {
    DEFAULT_RESUME_LOOKUP_TIMEOUT_SECS
}
fn default_true() -> bool {
    true
}
fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}
fn default_timeout() -> u64 {
    DEFAULT_CONNECTION_TIMEOUT_SECS
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.playback.checkpoint_interval(), Duration::from_secs(10));
        assert_eq!(config.playback.resume_threshold_secs, 0);
        assert!(config.playback.auto_fullscreen);
        assert_eq!(config.network.base_url, "http://localhost:8000/api");
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[playback]\ncheckpoint_interval_secs = 15\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.playback.checkpoint_interval_secs, 15);
        assert_eq!(config.playback.resume_lookup_timeout_secs, 5);
        assert_eq!(config.network.connection_timeout, 30);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.network.base_url = "https://streaming.example/api".to_string();
        config.playback.auto_fullscreen = false;
        config.save_to(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.network.base_url, "https://streaming.example/api");
        assert!(!reloaded.playback.auto_fullscreen);
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let config = PlaybackConfig {
            checkpoint_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.checkpoint_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "playback = 3").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}

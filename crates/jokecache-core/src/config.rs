//! Application configuration management.
//!
//! Configuration is stored at `~/.config/jokecache/config.json`. A missing
//! file yields defaults; `JOKECACHE_API_URL` and `JOKECACHE_CACHE_DIR`
//! override the file when set.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_API_URL;
use crate::controller::ControllerOptions;
use crate::models::DEFAULT_BATCH_SIZE;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "jokecache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Seconds between connectivity probes.
const DEFAULT_PROBE_INTERVAL_SECS: u64 = 5;

const API_URL_ENV: &str = "JOKECACHE_API_URL";
const CACHE_DIR_ENV: &str = "JOKECACHE_CACHE_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    /// Jokes per offline batch. The batch is exactly this many jokes after a
    /// complete prefetch; 10 unless overridden.
    pub batch_size: usize,
    /// Persist whatever arrived before a failed prefetch instead of discarding it.
    pub keep_partial_batch: bool,
    pub request_timeout_secs: Option<u64>,
    pub probe_interval_secs: u64,
    pub cache_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            keep_partial_batch: false,
            request_timeout_secs: None,
            probe_interval_secs: DEFAULT_PROBE_INTERVAL_SECS,
            cache_dir: None,
        }
    }
}

impl Config {
    /// Load from the config file, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Ok(path) => Self::load_from(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
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

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var(API_URL_ENV).filter(|v| !v.is_empty()) {
            self.api_url = url;
        }
        if let Some(dir) = var(CACHE_DIR_ENV).filter(|v| !v.is_empty()) {
            self.cache_dir = Some(PathBuf::from(dir));
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs.max(1))
    }

    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            batch_size: self.batch_size.max(1),
            keep_partial_batch: self.keep_partial_batch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load_from(&temp_dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.batch_size, 10);
        assert!(!config.keep_partial_batch);
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{"keep_partial_batch": true, "request_timeout_secs": 15}"#)
            .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(config.keep_partial_batch);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "{").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(|name| match name {
            API_URL_ENV => Some("http://localhost:3005/random_joke".to_string()),
            CACHE_DIR_ENV => Some("/tmp/jokes".to_string()),
            _ => None,
        });
        assert_eq!(config.api_url, "http://localhost:3005/random_joke");
        assert_eq!(config.cache_dir().unwrap(), PathBuf::from("/tmp/jokes"));
    }

    #[test]
    fn test_empty_env_values_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|_| Some(String::new()));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_controller_options_follow_config() {
        let config = Config {
            batch_size: 0,
            keep_partial_batch: true,
            ..Config::default()
        };
        let options = config.controller_options();
        assert_eq!(options.batch_size, 1);
        assert!(options.keep_partial_batch);
        assert_eq!(Config::default().controller_options(), ControllerOptions::default());
    }

    #[test]
    fn test_probe_interval_has_floor() {
        let config = Config {
            probe_interval_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.probe_interval(), Duration::from_secs(1));
    }
}

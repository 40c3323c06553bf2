//! Configuration management for Shiori.
//!
//! Handles loading, saving, and validating configuration from
//! platform-specific config directories.

use crate::error::ConfigError;
use crate::network::{DEFAULT_USER_AGENT, ResponseCache};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application name used for config and cache directories.
const APP_NAME: &str = "Shiori";

/// Default config filename.
const CONFIG_FILENAME: &str = "config.toml";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP client settings.
    pub network: NetworkConfig,

    /// Response cache settings.
    pub cache: CacheConfig,
}

/// HTTP client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Seconds allowed to establish a connection.
    pub connect_timeout_sec: u64,

    /// Seconds allowed between reads of the response body.
    pub read_timeout_sec: u64,

    /// User agent sent with every request.
    pub user_agent: String,

    /// Accept self-signed and expired certificates. Several novel sites
    /// serve broken chains.
    pub accept_invalid_certs: bool,

    /// Delay before each network request in seconds.
    pub delay_between_requests_sec: f64,

    /// Directory of Netscape-format cookie files to preload.
    pub cookies_directory: Option<PathBuf>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout_sec: 30,
            read_timeout_sec: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_invalid_certs: true,
            delay_between_requests_sec: 0.0,
            cookies_directory: None,
        }
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,

    /// Cache location; defaults to the platform cache directory.
    pub directory: Option<PathBuf>,

    /// Upper bound for the whole cache directory.
    pub max_size_bytes: u64,

    /// Entries older than this are refetched.
    pub max_age_sec: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: None,
            max_size_bytes: 5 * 1024 * 1024,
            max_age_sec: 600,
        }
    }
}

impl Config {
    /// Returns the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Returns the full path to the config file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join(CONFIG_FILENAME))
    }

    /// Loads configuration from the default location.
    ///
    /// If the config file doesn't exist, creates a default one.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Saves configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.connect_timeout_sec == 0 {
            return Err(invalid("network.connect_timeout_sec", "must be greater than 0"));
        }
        if self.network.read_timeout_sec == 0 {
            return Err(invalid("network.read_timeout_sec", "must be greater than 0"));
        }
        if self.network.user_agent.trim().is_empty() {
            return Err(invalid("network.user_agent", "must not be empty"));
        }
        if !self.network.delay_between_requests_sec.is_finite()
            || self.network.delay_between_requests_sec < 0.0
        {
            return Err(invalid(
                "network.delay_between_requests_sec",
                "must be a non-negative number",
            ));
        }
        if self.cache.enabled && self.cache.max_size_bytes == 0 {
            return Err(invalid("cache.max_size_bytes", "must be greater than 0"));
        }

        Ok(())
    }

    /// Returns the effective cache directory, using config or default.
    pub fn cache_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref dir) = self.cache.directory {
            Ok(dir.clone())
        } else {
            dirs::cache_dir()
                .map(|p| p.join(APP_NAME).join("http"))
                .ok_or(ConfigError::NoConfigDir)
        }
    }

    /// Builds the response cache, or `None` when caching is disabled.
    pub fn response_cache(&self) -> Result<Option<ResponseCache>, ConfigError> {
        if !self.cache.enabled {
            return Ok(None);
        }
        Ok(Some(ResponseCache::new(
            self.cache_dir()?,
            self.cache.max_size_bytes,
            Duration::from_secs(self.cache.max_age_sec),
        )))
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.network.connect_timeout_sec, 30);
        assert_eq!(config.network.read_timeout_sec, 30);
        assert!(config.network.accept_invalid_certs);
        assert_eq!(config.cache.max_size_bytes, 5 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_round_trip() {
        let mut config = Config::default();
        config.network.delay_between_requests_sec = 1.5;
        config.cache.enabled = false;
        let file = NamedTempFile::new().unwrap();

        config.save_to(file.path()).unwrap();

        let loaded = Config::load_from(file.path()).unwrap();
        assert_eq!(loaded.network.delay_between_requests_sec, 1.5);
        assert!(!loaded.cache.enabled);
        assert_eq!(loaded.network.user_agent, config.network.user_agent);
    }

    #[test]
    fn test_missing_file_creates_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILENAME);

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.network.read_timeout_sec, 30);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "[network]\nread_timeout_sec = 5\n").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.network.read_timeout_sec, 5);
        assert_eq!(config.network.connect_timeout_sec, 30);
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_parse_error() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "[network\n").unwrap();
        assert!(matches!(
            Config::load_from(file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.network.read_timeout_sec = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.network.delay_between_requests_sec = -1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.cache.max_size_bytes = 0;
        assert!(config.validate().is_err());
        config.cache.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cache_dir_override() {
        let mut config = Config::default();
        config.cache.directory = Some(PathBuf::from("/tmp/shiori-cache"));
        assert_eq!(config.cache_dir().unwrap(), PathBuf::from("/tmp/shiori-cache"));

        config.cache.enabled = false;
        assert!(config.response_cache().unwrap().is_none());
    }
}

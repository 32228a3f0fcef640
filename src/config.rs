use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: usize,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageSettings {
    /// Override for the selector store file; defaults to <data_dir>/selectors.json
    #[serde(default)]
    pub store_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json_format: bool,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .map_err(|_| ConfigError::NotFound(path.as_ref().display().to_string()))?;

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.settings.timeout == 0 {
            return Err(ConfigError::Invalid("Timeout must be greater than 0".to_string()));
        }

        if self.settings.max_page_size == 0 {
            return Err(ConfigError::Invalid("Max page size must be greater than 0".to_string()));
        }

        if let Some(store_file) = &self.storage.store_file {
            if store_file.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("Store file path cannot be empty".to_string()));
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(timeout) = std::env::var("PAGE_PRUNE_TIMEOUT") {
            if let Ok(val) = timeout.parse() {
                self.settings.timeout = val;
            }
        }

        if let Ok(level) = std::env::var("PAGE_PRUNE_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(store_file) = std::env::var("PAGE_PRUNE_STORE_FILE") {
            self.storage.store_file = Some(PathBuf::from(store_file));
        }
    }

    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("page-prune"))
            .ok_or_else(|| ConfigError::Invalid("Could not determine config directory".to_string()))
    }

    pub fn data_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join("page-prune"))
            .ok_or_else(|| ConfigError::Invalid("Could not determine data directory".to_string()))
    }

    /// Resolved path of the selector store file.
    pub fn store_file(&self) -> Result<PathBuf> {
        match &self.storage.store_file {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join("selectors.json")),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            storage: StorageSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout: default_timeout(),
            retry_attempts: default_retry_attempts(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

fn default_user_agent() -> String {
    format!("page-prune/{}", env!("CARGO_PKG_VERSION"))
}
fn default_timeout() -> u64 { 30 }
fn default_retry_attempts() -> usize { 3 }
fn default_max_page_size() -> usize { 5 * 1024 * 1024 } // 5MB

fn default_log_level() -> String { "info".to_string() }

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.settings.timeout, 30);
        assert_eq!(config.settings.retry_attempts, 3);
    }

    #[test]
    fn test_config_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.settings.timeout = 10;
        config.storage.store_file = Some(temp_dir.path().join("store.json"));
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.settings.timeout, 10);
        assert_eq!(loaded.storage.store_file, config.storage.store_file);
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let mut config = Config::default();
        config.settings.timeout = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("[settings]\ntimeout = 5\n").unwrap();
        assert_eq!(config.settings.timeout, 5);
        assert_eq!(config.settings.retry_attempts, 3);
        assert!(config.storage.store_file.is_none());
    }
}

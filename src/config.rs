use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Snapshot directory; the platform cache dir when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub log_to_file: bool,

    #[serde(default = "default_log_file")]
    pub log_file: String,

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
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise; env overrides apply to both.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            return Self::load_with_env(path);
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.remote.base_url)
            .map_err(|_| ConfigError::InvalidUrl(self.remote.base_url.clone()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(self.remote.base_url.clone()));
        }

        if self.remote.timeout_secs == 0 {
            return Err(ConfigError::Invalid("Timeout must be greater than 0".to_string()));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(base_url) = std::env::var("HELP_ARTICLES_BASE_URL") {
            self.remote.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("HELP_ARTICLES_TIMEOUT") {
            if let Ok(val) = timeout.parse() {
                self.remote.timeout_secs = val;
            }
        }

        if let Ok(level) = std::env::var("HELP_ARTICLES_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("help-articles"))
            .ok_or_else(|| ConfigError::Config("Could not determine config directory".to_string()))
    }

    pub fn default_config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Directory holding the cache snapshot.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.cache.cache_dir {
            return Ok(dir.clone());
        }

        dirs::cache_dir()
            .map(|dir| dir.join("help-articles"))
            .ok_or_else(|| ConfigError::Config("Could not determine cache directory".to_string()))
    }
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_to_file: false,
            log_file: default_log_file(),
            json_format: false,
        }
    }
}

fn default_base_url() -> String { "http://localhost:8080/api".to_string() }
fn default_timeout() -> u64 { 15 }
fn default_user_agent() -> String {
    format!("help-articles/{}", env!("CARGO_PKG_VERSION"))
}

fn default_log_level() -> String { "warn".to_string() }
fn default_log_file() -> String { "logs/help-articles.log".to_string() }

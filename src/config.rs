//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and `AWQL_*` environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub adwords: AdwordsConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Report download service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AdwordsConfig {
    /// Client customer id the reports are downloaded for
    #[serde(default)]
    pub account_id: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default)]
    pub developer_token: String,

    /// OAuth2 bearer token
    #[serde(default)]
    pub access_token: String,

    /// Include rows without any impression
    #[serde(default)]
    pub zero_impressions: bool,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

fn default_api_version() -> String {
    "v201809".to_string()
}

fn default_request_timeout() -> u64 {
    600 // reports can take minutes to build
}

fn default_endpoint() -> String {
    "https://adwords.google.com/api/adwords/reportdownload/".to_string()
}

impl AdwordsConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for AdwordsConfig {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            api_version: default_api_version(),
            developer_token: String::new(),
            access_token: String::new(),
            zero_impressions: false,
            request_timeout_secs: default_request_timeout(),
            endpoint: default_endpoint(),
        }
    }
}

/// Report cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_cache_dir")]
    pub dir: String,

    #[serde(default = "default_max_age")]
    pub max_age_secs: u64,

    /// Pending writes before new ones are dropped
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,
}

fn default_cache_dir() -> String {
    dirs::cache_dir()
        .map(|p| p.join("awql").to_string_lossy().to_string())
        .unwrap_or_else(|| "./awql_cache".to_string())
}

fn default_max_age() -> u64 {
    86400 // 1 day
}

fn default_queue_size() -> usize {
    32
}

impl CacheConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }

    pub fn dir_path(&self) -> PathBuf {
        expand_home(&self.dir)
    }
}

/// Resolve a leading `~/` against the home directory
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: default_cache_dir(),
            max_age_secs: default_max_age(),
            queue_size: default_queue_size(),
        }
    }
}

/// Catalog document location
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_path")]
    pub path: String,
}

fn default_catalog_path() -> String {
    dirs::config_dir()
        .map(|p| p.join("awql").join("catalog.json").to_string_lossy().to_string())
        .unwrap_or_else(|| "./catalog.json".to_string())
}

impl CatalogConfig {
    pub fn file_path(&self) -> PathBuf {
        expand_home(&self.path)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("awql").join("config.toml")),
            Some(PathBuf::from("./awql.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(id) = var("AWQL_ACCOUNT_ID") {
            self.adwords.account_id = id;
        }
        if let Some(version) = var("AWQL_API_VERSION") {
            self.adwords.api_version = version;
        }
        if let Some(token) = var("AWQL_DEVELOPER_TOKEN") {
            self.adwords.developer_token = token;
        }
        if let Some(token) = var("AWQL_ACCESS_TOKEN") {
            self.adwords.access_token = token;
        }

        if let Some(dir) = var("AWQL_CACHE_DIR") {
            self.cache.dir = dir;
            self.cache.enabled = true;
        }
        if let Some(path) = var("AWQL_CATALOG") {
            self.catalog.path = path;
        }

        if let Some(level) = var("AWQL_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("AWQL_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# AWQL Configuration
#
# Environment variables override these settings:
# - AWQL_ACCOUNT_ID
# - AWQL_API_VERSION
# - AWQL_DEVELOPER_TOKEN
# - AWQL_ACCESS_TOKEN
# - AWQL_CACHE_DIR (also enables the cache)
# - AWQL_CATALOG
# - AWQL_LOG_LEVEL
# - AWQL_LOG_FORMAT

[adwords]
# Client customer id, e.g. "123-456-7890"
account_id = ""

# Reporting API version
api_version = "v201809"

# Developer token and OAuth2 access token
developer_token = ""
access_token = ""

# Include rows without impressions
zero_impressions = false

# Report download timeout in seconds
request_timeout_secs = 600

# Report download endpoint, the API version is appended
endpoint = "https://adwords.google.com/api/adwords/reportdownload/"

[cache]
# Keep downloaded reports on disk
enabled = false

# Directory of cached reports
dir = "~/.cache/awql"

# Maximum age of a cached report in seconds
max_age_secs = 86400

# Pending cache writes before new ones are dropped
queue_size = 32

[catalog]
# JSON document describing reports and views
path = "~/.config/awql/catalog.json"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

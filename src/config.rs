//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub live: LiveConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// News server connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Live-update stream settings
#[derive(Debug, Clone, Deserialize)]
pub struct LiveConfig {
    #[serde(default = "default_stream_path")]
    pub stream_path: String,

    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_multiplier")]
    pub multiplier: u32,

    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_notice_capacity")]
    pub notice_capacity: usize,
}

fn default_stream_path() -> String {
    "/sse".to_string()
}

fn default_initial_delay() -> u64 {
    1000 // 1 second
}

fn default_multiplier() -> u32 {
    2
}

fn default_max_delay() -> u64 {
    30_000 // 30 seconds
}

fn default_max_attempts() -> u32 {
    5
}

fn default_notice_capacity() -> usize {
    64
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            stream_path: default_stream_path(),
            initial_delay_ms: default_initial_delay(),
            multiplier: default_multiplier(),
            max_delay_ms: default_max_delay(),
            max_attempts: default_max_attempts(),
            notice_capacity: default_notice_capacity(),
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

    pub file: Option<String>,
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
            file: None,
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

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
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
            dirs::config_dir().map(|p| p.join("newsfeed").join("config.toml")),
            Some(PathBuf::from("./newsfeed.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("NEWSFEED_SERVER_URL") {
            self.server.base_url = url;
        }

        if let Some(path) = var("NEWSFEED_STREAM_PATH") {
            self.live.stream_path = path;
        }
        if let Some(attempts) = var("NEWSFEED_MAX_ATTEMPTS") {
            match attempts.parse() {
                Ok(n) => self.live.max_attempts = n,
                Err(_) => tracing::warn!("Ignoring invalid NEWSFEED_MAX_ATTEMPTS: {}", attempts),
            }
        }

        if let Some(level) = var("NEWSFEED_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("NEWSFEED_LOG_FORMAT") {
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
    r#"# Newsfeed Live Configuration
#
# Environment variables override these settings:
# - NEWSFEED_SERVER_URL
# - NEWSFEED_STREAM_PATH
# - NEWSFEED_MAX_ATTEMPTS
# - NEWSFEED_LOG_LEVEL
# - NEWSFEED_LOG_FORMAT

[server]
# News server base URL
base_url = "http://localhost:8080"

# Timeout for data requests, also used as the stream connect timeout (seconds)
request_timeout_secs = 30

[live]
# Event stream path on the server
stream_path = "/sse"

# First reconnect delay (ms); doubles per attempt up to max_delay_ms
initial_delay_ms = 1000
multiplier = 2
max_delay_ms = 30000

# Reconnects before giving up; a received init event resets the count
max_attempts = 5

# Buffered lifecycle notices per observer
notice_capacity = 64

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/newsfeed/newsfeed.log"
"#
    .to_string()
}

//! Logger configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via GECKOLOG_CONFIG)
//! 3. Environment variables
//! 4. Command-line flags, applied by the executable

use crate::layout::MatchLayout;
use crate::report::LogLevel;
use crate::watch::WatchConfig;
use geckolog_client::{ConnectionConfig, RetryPolicy, Variant};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Logger configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Console connection.
    pub connection: ConnectionSection,
    /// Log output.
    pub logging: LoggingConfig,
    /// Retry and polling pace.
    pub polling: PollingConfig,
    /// Memory layout overrides.
    pub layout: MatchLayout,
}

impl Config {
    /// Loads configuration from file, then applies environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("GECKOLOG_CONFIG") {
            config = Self::from_file(&path)?;
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))
    }

    fn apply_env_overrides(&mut self) {
        self.connection.apply_env_overrides();
        self.logging.apply_env_overrides();
        self.polling.apply_env_overrides();
    }

    /// Builds the connection config. Fails when no console address is set.
    pub fn connection_config(&self) -> Result<ConnectionConfig, ConfigError> {
        let ip = self
            .connection
            .ip
            .ok_or_else(|| ConfigError::ValidationError("no console IP address given".into()))?;

        let mut config = ConnectionConfig::new(ip, self.connection.variant.into())
            .with_connect_timeout(Duration::from_secs(self.connection.connect_timeout_secs))
            .with_request_timeout(Duration::from_secs(self.connection.request_timeout_secs));
        if let Some(port) = self.connection.port {
            config = config.with_port(port);
        }
        Ok(config)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.polling.max_attempts,
            Duration::from_secs(self.polling.backoff_secs),
        )
    }

    pub fn watch_config(&self) -> WatchConfig {
        WatchConfig {
            interval: Duration::from_secs(self.polling.stats_interval_secs),
            max_polls: (self.polling.stats_max_polls > 0).then_some(self.polling.stats_max_polls),
        }
    }
}

/// Wire variant as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantSetting {
    #[default]
    Classic,
    /// Aroma plugin.
    Text,
}

impl From<VariantSetting> for Variant {
    fn from(setting: VariantSetting) -> Self {
        match setting {
            VariantSetting::Classic => Variant::Classic,
            VariantSetting::Text => Variant::Text,
        }
    }
}

impl FromStr for VariantSetting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "classic" | "tcpgecko" => Ok(VariantSetting::Classic),
            "text" | "aroma" => Ok(VariantSetting::Text),
            other => Err(format!("unknown variant '{}'", other)),
        }
    }
}

/// Console connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSection {
    /// Console address.
    pub ip: Option<IpAddr>,
    /// Overrides the variant's default port.
    pub port: Option<u16>,
    pub variant: VariantSetting,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for ConnectionSection {
    fn default() -> Self {
        Self {
            ip: None,
            port: None,
            variant: VariantSetting::Classic,
            connect_timeout_secs: 10,
            request_timeout_secs: 10,
        }
    }
}

impl ConnectionSection {
    fn apply_env_overrides(&mut self) {
        if let Ok(ip) = std::env::var("GECKOLOG_IP") {
            if let Ok(parsed) = ip.parse() {
                self.ip = Some(parsed);
            }
        }

        if let Ok(port) = std::env::var("GECKOLOG_PORT") {
            if let Ok(parsed) = port.parse() {
                self.port = Some(parsed);
            }
        }

        if let Ok(variant) = std::env::var("GECKOLOG_VARIANT") {
            if let Ok(parsed) = variant.parse() {
                self.variant = parsed;
            }
        }
    }
}

/// Auto-logging mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoMode {
    /// All matches of a run go into one file.
    All,
    /// Each match starts a new file.
    Latest,
}

impl FromStr for AutoMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(AutoMode::All),
            "latest" => Ok(AutoMode::Latest),
            other => Err(format!("unknown auto mode '{}'", other)),
        }
    }
}

/// Log output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// Watch for matches instead of logging once.
    pub auto: Option<AutoMode>,
    /// Suppresses console output.
    pub silent: bool,
    /// Root directory for log files.
    pub dir: PathBuf,
    /// JSON file with display names.
    pub names_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::None,
            auto: None,
            silent: false,
            dir: PathBuf::from("./logs"),
            names_file: None,
        }
    }
}

impl LoggingConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("GECKOLOG_LOG_LEVEL") {
            if let Ok(parsed) = level.parse() {
                self.level = parsed;
            }
        }

        if let Ok(auto) = std::env::var("GECKOLOG_AUTO") {
            if let Ok(parsed) = auto.parse() {
                self.auto = Some(parsed);
            }
        }

        if let Ok(dir) = std::env::var("GECKOLOG_LOG_DIR") {
            self.dir = PathBuf::from(dir);
        }

        if let Ok(path) = std::env::var("GECKOLOG_NAMES") {
            self.names_file = Some(PathBuf::from(path));
        }
    }
}

/// Retry and polling pace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Attempts per unit of work before giving up.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub backoff_secs: u64,
    /// Pause between scene checks in auto mode.
    pub scene_interval_secs: u64,
    /// Pause between stats polls.
    pub stats_interval_secs: u64,
    /// Stats polls before giving up (0 = unbounded).
    pub stats_max_polls: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_secs: 10,
            scene_interval_secs: 10,
            stats_interval_secs: 5,
            stats_max_polls: 360,
        }
    }
}

impl PollingConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(attempts) = std::env::var("GECKOLOG_MAX_ATTEMPTS") {
            if let Ok(n) = attempts.parse() {
                self.max_attempts = n;
            }
        }

        if let Ok(backoff) = std::env::var("GECKOLOG_BACKOFF") {
            if let Ok(secs) = backoff.parse() {
                self.backoff_secs = secs;
            }
        }
    }

    pub fn scene_interval(&self) -> Duration {
        Duration::from_secs(self.scene_interval_secs)
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(PathBuf, std::io::Error),
    ParseError(PathBuf, String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, e) => {
                write!(f, "failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::ValidationError(msg) => {
                write!(f, "configuration validation failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

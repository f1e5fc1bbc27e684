use serde::{Deserialize, Serialize};

/// Client configuration, stored as JSON
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub version: String,
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub poller: PollerConfig,
    pub startup: StartupConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            api: ApiConfig::default(),
            session: SessionConfig::default(),
            poller: PollerConfig::default(),
            startup: StartupConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Read a value by dotted key, e.g. `api.base_url`
    pub fn get_value(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["version"] => Some(self.version.clone()),
            ["api", "base_url"] => self.api.base_url.clone(),
            ["api", "request_timeout_secs"] => Some(self.api.request_timeout_secs.to_string()),
            ["session", "storage_path"] => self.session.storage_path.clone(),
            ["poller", "interval_ms"] => Some(self.poller.interval_ms.to_string()),
            ["poller", "success_dwell_ms"] => Some(self.poller.success_dwell_ms.to_string()),
            ["poller", "error_dwell_ms"] => Some(self.poller.error_dwell_ms.to_string()),
            ["startup", "watchdog_secs"] => Some(self.startup.watchdog_secs.to_string()),
            ["logging", "level"] => Some(self.logging.level.to_string()),
            ["logging", "file"] => self.logging.file.clone(),
            ["logging", "json"] => Some(self.logging.json.to_string()),
            _ => None,
        }
    }

    /// Set a value by dotted key
    pub fn set_value(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["api", "base_url"] => {
                self.api.base_url = Some(value.to_string());
            }
            ["api", "request_timeout_secs"] => {
                self.api.request_timeout_secs = parse_number(value)?;
            }
            ["session", "storage_path"] => {
                self.session.storage_path = Some(value.to_string());
            }
            ["poller", "interval_ms"] => {
                self.poller.interval_ms = parse_number(value)?;
            }
            ["poller", "success_dwell_ms"] => {
                self.poller.success_dwell_ms = parse_number(value)?;
            }
            ["poller", "error_dwell_ms"] => {
                self.poller.error_dwell_ms = parse_number(value)?;
            }
            ["startup", "watchdog_secs"] => {
                self.startup.watchdog_secs = parse_number(value)?;
            }
            ["logging", "level"] => {
                self.logging.level = value.parse()?;
            }
            ["logging", "file"] => {
                self.logging.file = Some(value.to_string());
            }
            ["logging", "json"] => {
                self.logging.json = value.parse().map_err(|_| {
                    ConfigError::Validation(format!("Invalid boolean: {}", value))
                })?;
            }
            _ => return Err(ConfigError::KeyNotFound(key.to_string())),
        }
        Ok(())
    }
}

fn parse_number(value: &str) -> ConfigResult<u64> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(format!("Invalid number: {}", value)))
}

/// Backend API settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// Overridden by `ONCALL_API_URL`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_secs: 60,
        }
    }
}

/// Where the session id lives
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub storage_path: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_path: Some("~/.oncall/storage.json".to_string()),
        }
    }
}

/// Reindex progress polling
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PollerConfig {
    pub interval_ms: u64,
    pub success_dwell_ms: u64,
    pub error_dwell_ms: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 500,
            success_dwell_ms: 3_000,
            error_dwell_ms: 5_000,
        }
    }
}

/// Startup connectivity watchdog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StartupConfig {
    pub watchdog_secs: u64,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self { watchdog_secs: 5 }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::Validation(format!("Invalid log level: {}", s))),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// Directory for daily-rolling JSON log files; `None` disables file logging
    pub file: Option<String>,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: Some("~/.oncall/logs".to_string()),
            json: false,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

pub mod config;
pub mod manager;

pub use config::{
    ApiConfig, Config, ConfigError, ConfigResult, LogLevel, LoggingConfig, PollerConfig,
    SessionConfig, StartupConfig,
};
pub use manager::ConfigManager;

use std::path::PathBuf;

/// Environment variable that overrides the backend base URL
pub const API_URL_ENV: &str = "ONCALL_API_URL";

/// Base URL used when neither the environment nor the config names one
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Client state directory (~/.oncall)
pub fn oncall_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".oncall"))
}

/// Default config file path
pub fn default_config_path() -> Option<PathBuf> {
    oncall_dir().map(|dir| dir.join("config.json"))
}

/// Default key/value storage file holding the session id
pub fn default_storage_path() -> Option<PathBuf> {
    oncall_dir().map(|dir| dir.join("storage.json"))
}

/// Default log directory
pub fn default_log_dir() -> Option<PathBuf> {
    oncall_dir().map(|dir| dir.join("logs"))
}

/// Create the client directory layout
pub async fn init_oncall_dirs() -> ConfigResult<()> {
    if let Some(logs) = default_log_dir() {
        tokio::fs::create_dir_all(&logs).await?;
    }
    Ok(())
}

/// Expand a leading `~/` to the home directory
pub fn expand_tilde(path: &str) -> Option<PathBuf> {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir().map(|home| home.join(rest))
    } else {
        Some(PathBuf::from(path))
    }
}

/// Pick the backend base URL: environment first, then config, then the local default.
///
/// Trailing slashes are dropped so endpoint paths can be appended directly.
pub fn resolve_api_base_url(configured: Option<&str>) -> String {
    let from_env = std::env::var(API_URL_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty());
    let chosen = from_env
        .or_else(|| {
            configured
                .filter(|value| !value.trim().is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    chosen.trim().trim_end_matches('/').to_string()
}

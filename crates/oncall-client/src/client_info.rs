use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Best-effort description of the client, sent as `X-Client-Info`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub user_agent: String,
    pub platform: String,
    pub language: String,
    pub screen_size: String,
    pub timestamp: String,
    pub referrer: String,
    pub url: String,
}

impl ClientInfo {
    /// Collect what the process can tell about itself
    pub fn collect(base_url: &str) -> Self {
        Self {
            user_agent: format!("oncall-cli/{}", env!("CARGO_PKG_VERSION")),
            platform: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
            language: detect_language(),
            screen_size: detect_terminal_size(),
            timestamp: Utc::now().to_rfc3339(),
            referrer: String::new(),
            url: base_url.to_string(),
        }
    }

    /// JSON form used in the header; empty object if encoding fails
    pub fn to_header_value(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

fn detect_language() -> String {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.is_empty())
        .map(|value| {
            // ko_KR.UTF-8 -> ko-KR
            let locale = value.split('.').next().unwrap_or_default();
            locale.replace('_', "-")
        })
        .unwrap_or_else(|| "unknown".to_string())
}

fn detect_terminal_size() -> String {
    let columns = std::env::var("COLUMNS").ok();
    let lines = std::env::var("LINES").ok();
    match (columns, lines) {
        (Some(c), Some(l)) => format!("{}x{}", c, l),
        _ => "unknown".to_string(),
    }
}

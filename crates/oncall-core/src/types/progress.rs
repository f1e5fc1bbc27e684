use serde::{Deserialize, Serialize};

/// Phase of the backend reindex job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStatus {
    Idle,
    Running,
    Completed,
    Error,
}

impl std::fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateStatus::Idle => write!(f, "idle"),
            UpdateStatus::Running => write!(f, "running"),
            UpdateStatus::Completed => write!(f, "completed"),
            UpdateStatus::Error => write!(f, "error"),
        }
    }
}

/// Progress report as returned by `GET /update-progress`.
///
/// `progress` is a percentage and only meaningful while running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProgress {
    pub status: UpdateStatus,
    #[serde(default, deserialize_with = "deserialize_percent")]
    pub progress: u8,
    #[serde(default)]
    pub message: String,
}

impl UpdateProgress {
    pub fn idle() -> Self {
        Self {
            status: UpdateStatus::Idle,
            progress: 0,
            message: String::new(),
        }
    }

    pub fn running(progress: u8, message: impl Into<String>) -> Self {
        Self {
            status: UpdateStatus::Running,
            progress: progress.min(100),
            message: message.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, UpdateStatus::Completed | UpdateStatus::Error)
    }
}

impl Default for UpdateProgress {
    fn default() -> Self {
        Self::idle()
    }
}

// Backends report progress as a JSON number, sometimes fractional.
fn deserialize_percent<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Ok(value.round().clamp(0.0, 100.0) as u8)
}

use async_trait::async_trait;
use oncall_core::UpdateProgress;
use serde::{Deserialize, Serialize};

use crate::client_info::ClientInfo;
use crate::error::Result;

/// Body of `POST /chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: String,
}

/// Response of `POST /chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
}

/// Response of `GET /departments`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentsResponse {
    pub status: String,
    #[serde(default)]
    pub departments: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DepartmentsResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Response of `GET /update-vectors`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStartResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl UpdateStartResponse {
    pub fn is_started(&self) -> bool {
        self.status == "started"
    }
}

/// The answering service, seen from the client
#[async_trait]
pub trait DutyBackend: Send + Sync {
    /// Base URL, for diagnostics
    fn base_url(&self) -> &str;

    async fn chat(&self, request: &ChatRequest, client_info: &ClientInfo) -> Result<ChatAnswer>;

    async fn departments(&self) -> Result<DepartmentsResponse>;

    /// Trigger a reindex of the backend's retrieval data
    async fn start_update(&self) -> Result<UpdateStartResponse>;

    async fn update_progress(&self) -> Result<UpdateProgress>;
}

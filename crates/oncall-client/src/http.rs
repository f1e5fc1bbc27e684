use std::time::Duration;

use async_trait::async_trait;
use oncall_core::UpdateProgress;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::backend::{
    ChatAnswer, ChatRequest, DepartmentsResponse, DutyBackend, UpdateStartResponse,
};
use crate::client_info::ClientInfo;
use crate::error::{ClientError, Result};

pub const SESSION_HEADER: &str = "X-Session-ID";
pub const CLIENT_INFO_HEADER: &str = "X-Client-Info";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// reqwest-backed [`DutyBackend`]
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    client: Client,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(network_error)?;

        read_json(response).await
    }
}

fn network_error(e: reqwest::Error) -> ClientError {
    ClientError::Network(e.to_string())
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), "Backend returned error status");
        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let body = response.text().await.map_err(network_error)?;
    serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
}

#[async_trait]
impl DutyBackend for HttpBackend {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn chat(&self, request: &ChatRequest, client_info: &ClientInfo) -> Result<ChatAnswer> {
        tracing::debug!(session_id = %request.session_id, "POST /chat");

        let response = self
            .client
            .post(self.url("/chat"))
            .header(SESSION_HEADER, &request.session_id)
            .header(CLIENT_INFO_HEADER, client_info.to_header_value())
            .json(request)
            .send()
            .await
            .map_err(network_error)?;

        read_json(response).await
    }

    async fn departments(&self) -> Result<DepartmentsResponse> {
        self.get_json("/departments").await
    }

    async fn start_update(&self) -> Result<UpdateStartResponse> {
        self.get_json("/update-vectors").await
    }

    async fn update_progress(&self) -> Result<UpdateProgress> {
        self.get_json("/update-progress").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oncall_core::UpdateStatus;

    fn info() -> ClientInfo {
        ClientInfo::collect("http://test")
    }

    #[tokio::test]
    async fn test_chat_sends_session_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .match_header("x-session-id", "session-1")
            .match_header("x-client-info", mockito::Matcher::Regex("userAgent".into()))
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"message":"오늘 외과 당직","session_id":"session-1"}"#.into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"answer":"외과 당직의는 김철수입니다."}"#)
            .create_async()
            .await;

        let backend = HttpBackend::new(&server.url()).unwrap();
        let request = ChatRequest {
            message: "오늘 외과 당직".to_string(),
            session_id: "session-1".to_string(),
        };
        let answer = backend.chat(&request, &info()).await.unwrap();

        assert_eq!(answer.answer, "외과 당직의는 김철수입니다.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_maps_to_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let backend = HttpBackend::new(&server.url()).unwrap();
        let request = ChatRequest {
            message: "외과".to_string(),
            session_id: "s".to_string(),
        };
        let err = backend.chat(&request, &info()).await.unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert!(!err.is_unreachable());
    }

    #[tokio::test]
    async fn test_departments_and_progress() {
        let mut server = mockito::Server::new_async().await;
        let _departments = server
            .mock("GET", "/departments")
            .with_status(200)
            .with_body(r#"{"status":"success","departments":["외과","내과"]}"#)
            .create_async()
            .await;
        let _progress = server
            .mock("GET", "/update-progress")
            .with_status(200)
            .with_body(r#"{"status":"running","progress":42.6,"message":"임베딩 중"}"#)
            .create_async()
            .await;

        let backend = HttpBackend::new(&format!("{}/", server.url())).unwrap();

        let departments = backend.departments().await.unwrap();
        assert!(departments.is_success());
        assert_eq!(departments.departments, vec!["외과", "내과"]);

        let progress = backend.update_progress().await.unwrap();
        assert_eq!(progress.status, UpdateStatus::Running);
        assert_eq!(progress.progress, 43);
    }

    #[tokio::test]
    async fn test_bad_body_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/update-vectors")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let backend = HttpBackend::new(&server.url()).unwrap();
        let err = backend.start_update().await.unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        let backend = HttpBackend::with_timeout("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let err = backend.departments().await.unwrap_err();
        assert!(err.is_unreachable());
    }
}

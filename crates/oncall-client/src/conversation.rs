//! The chat transcript and the rules for sending one message.

use std::sync::Arc;
use std::time::Duration;

use oncall_core::{texts, DepartmentDirectory, DepartmentMatcher, Message, QueryClassifier};
use oncall_session::SessionStore;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::backend::{ChatRequest, DutyBackend};
use crate::client_info::ClientInfo;
use crate::departments::{load_departments, load_with_watchdog, DirectoryLoad, DirectorySource};
use crate::error::{ClientError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub loading: bool,
    pub connection_error: bool,
    pub retry_count: u32,
    pub departments: DepartmentDirectory,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            messages: vec![Message::bot(texts::WELCOME)],
            loading: false,
            connection_error: false,
            retry_count: 0,
            departments: DepartmentDirectory::fallback(),
        }
    }
}

/// What happened to one `send_message` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input, nothing appended
    Ignored,
    /// Another send is still in flight
    Busy,
    /// Rejected locally with the guidance message
    OutOfDomain,
    Answered,
    /// Answer carried a no-result phrase; retry guidance appended
    Augmented,
    Failed,
    /// The controller was shut down while waiting; the reply was dropped
    Discarded,
}

pub struct ConversationController {
    backend: Arc<dyn DutyBackend>,
    classifier: QueryClassifier,
    session: Mutex<SessionStore>,
    state: Arc<RwLock<ConversationState>>,
    closed: CancellationToken,
}

impl ConversationController {
    pub fn new(backend: Arc<dyn DutyBackend>, session: SessionStore) -> Self {
        Self::with_classifier(backend, session, QueryClassifier::new())
    }

    pub fn with_classifier(
        backend: Arc<dyn DutyBackend>,
        session: SessionStore,
        classifier: QueryClassifier,
    ) -> Self {
        Self {
            backend,
            classifier,
            session: Mutex::new(session),
            state: Arc::new(RwLock::new(ConversationState::default())),
            closed: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> ConversationState {
        self.state.read().clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state.read().messages.clone()
    }

    pub fn departments(&self) -> DepartmentDirectory {
        self.state.read().departments.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().loading
    }

    pub async fn session_id(&self) -> String {
        self.session.lock().await.id().to_string()
    }

    /// Startup load of the department list.
    ///
    /// Raises the connection flag early if the backend is slower than
    /// `watchdog`; the final result overrides it.
    pub async fn initialize(&self, watchdog: Duration) -> DirectoryLoad {
        let state = Arc::clone(&self.state);
        let load = load_with_watchdog(self.backend.as_ref(), watchdog, move || {
            state.write().connection_error = true;
        })
        .await;
        self.apply_directory(&load);
        load
    }

    /// Reload the department list after a connection failure
    pub async fn retry_connection(&self) -> DirectoryLoad {
        let attempt = {
            let mut state = self.state.write();
            state.retry_count += 1;
            state.retry_count
        };
        tracing::info!(attempt, "Retrying backend connection");

        let load = load_departments(self.backend.as_ref()).await;
        self.apply_directory(&load);
        load
    }

    fn apply_directory(&self, load: &DirectoryLoad) {
        let mut state = self.state.write();
        state.departments = load.directory.clone();
        state.connection_error = load.connection_error;
        if load.source == DirectorySource::Backend {
            state.retry_count = 0;
        }
    }

    /// Record a backend failure seen outside the chat flow, e.g. a failed reindex
    pub fn mark_disconnected(&self) {
        self.state.write().connection_error = true;
    }

    /// Rotate the session id and clear the transcript
    pub async fn reset_session(&self) -> Result<String> {
        let new_id = {
            let mut session = self.session.lock().await;
            session.reset().await.map_err(ClientError::from)?.to_string()
        };
        self.state.write().messages.clear();
        Ok(new_id)
    }

    pub async fn send_message(&self, text: &str) -> SendOutcome {
        if text.trim().is_empty() {
            return SendOutcome::Ignored;
        }

        {
            let mut state = self.state.write();
            if state.loading {
                return SendOutcome::Busy;
            }
            state.messages.push(Message::user(text));
            state.loading = true;
        }

        let outcome = self.dispatch(text).await;
        self.state.write().loading = false;
        outcome
    }

    async fn dispatch(&self, text: &str) -> SendOutcome {
        let classification = self.classifier.classify(text);
        if !classification.is_valid() {
            tracing::debug!("Query rejected as out of domain");
            self.push_bot(texts::OUT_OF_DOMAIN_GUIDANCE);
            return SendOutcome::OutOfDomain;
        }
        {
            let state = self.state.read();
            let matcher = DepartmentMatcher::new(state.departments.names());
            tracing::debug!(
                ?classification,
                duty_related = self.classifier.is_duty_related(text),
                departments = ?matcher.find_similar_departments(text),
                ambiguous = matcher.has_ambiguous_match(text),
                "Query accepted"
            );
        }

        let request = ChatRequest {
            message: text.to_string(),
            session_id: self.session_id().await,
        };
        let client_info = ClientInfo::collect(self.backend.base_url());

        let result = tokio::select! {
            result = self.backend.chat(&request, &client_info) => result,
            _ = self.closed.cancelled() => return SendOutcome::Discarded,
        };

        match result {
            Ok(answer) => {
                {
                    let mut state = self.state.write();
                    state.connection_error = false;
                    state.retry_count = 0;
                }
                if texts::is_no_result_answer(&answer.answer) {
                    self.push_bot(texts::with_retry_guidance(&answer.answer));
                    SendOutcome::Augmented
                } else {
                    self.push_bot(answer.answer);
                    SendOutcome::Answered
                }
            }
            Err(e) => {
                tracing::error!(error = %e, session_id = %request.session_id, "Chat request failed");
                let diagnostic = match &e {
                    ClientError::Network(_) => texts::unreachable_backend(self.backend.base_url()),
                    ClientError::Api { status, .. } => texts::server_error(*status),
                    ClientError::Decode(_) => texts::server_error_detail(texts::MALFORMED_RESPONSE),
                    other => texts::server_error_detail(&other.to_string()),
                };
                let mut state = self.state.write();
                state.messages.push(Message::bot(diagnostic));
                state.connection_error = true;
                SendOutcome::Failed
            }
        }
    }

    fn push_bot(&self, text: impl Into<String>) {
        self.state.write().messages.push(Message::bot(text));
    }

    /// Stop waiting on in-flight requests; their replies are dropped
    pub fn shutdown(&self) {
        self.closed.cancel();
    }
}

impl Drop for ConversationController {
    fn drop(&mut self) {
        self.closed.cancel();
    }
}

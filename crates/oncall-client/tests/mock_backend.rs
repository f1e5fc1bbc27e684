use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use oncall_client::{
    ChatAnswer, ChatRequest, ClientError, ClientInfo, DepartmentsResponse, DutyBackend,
    Result, UpdateStartResponse,
};
use oncall_core::{UpdateProgress, UpdateStatus};
use parking_lot::Mutex;

pub enum ChatReply {
    Answer(String),
    Status(u16),
    /// 2xx with a body that is not a chat answer
    Malformed,
    Unreachable,
}

#[derive(Clone)]
pub enum DepartmentsReply {
    List(Vec<String>),
    Refused(String),
    Unreachable,
}

#[derive(Clone)]
pub enum StartReply {
    Started,
    Refused(String),
    Status(u16),
    Unreachable,
}

pub enum ProgressReply {
    Progress(UpdateProgress),
    Unreachable,
}

/// Scripted backend for testing
pub struct MockBackend {
    chat_replies: Mutex<VecDeque<ChatReply>>,
    chat_delay: Mutex<Duration>,
    chat_requests: Mutex<Vec<ChatRequest>>,
    departments: Mutex<DepartmentsReply>,
    departments_delay: Mutex<Duration>,
    start: Mutex<StartReply>,
    start_delay: Mutex<Duration>,
    progress: Mutex<VecDeque<ProgressReply>>,
    progress_calls: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            chat_replies: Mutex::new(VecDeque::new()),
            chat_delay: Mutex::new(Duration::ZERO),
            chat_requests: Mutex::new(Vec::new()),
            departments: Mutex::new(DepartmentsReply::List(vec![
                "외과".to_string(),
                "내과".to_string(),
            ])),
            departments_delay: Mutex::new(Duration::ZERO),
            start: Mutex::new(StartReply::Started),
            start_delay: Mutex::new(Duration::ZERO),
            progress: Mutex::new(VecDeque::new()),
            progress_calls: AtomicUsize::new(0),
        }
    }

    pub fn push_chat(&self, reply: ChatReply) {
        self.chat_replies.lock().push_back(reply);
    }

    pub fn set_chat_delay(&self, delay: Duration) {
        *self.chat_delay.lock() = delay;
    }

    pub fn chat_requests(&self) -> Vec<ChatRequest> {
        self.chat_requests.lock().clone()
    }

    pub fn set_departments(&self, reply: DepartmentsReply) {
        *self.departments.lock() = reply;
    }

    pub fn set_departments_delay(&self, delay: Duration) {
        *self.departments_delay.lock() = delay;
    }

    pub fn set_start(&self, reply: StartReply) {
        *self.start.lock() = reply;
    }

    pub fn set_start_delay(&self, delay: Duration) {
        *self.start_delay.lock() = delay;
    }

    pub fn push_progress(&self, reply: ProgressReply) {
        self.progress.lock().push_back(reply);
    }

    pub fn progress_calls(&self) -> usize {
        self.progress_calls.load(Ordering::SeqCst)
    }
}

fn unreachable() -> ClientError {
    ClientError::Network("connection refused".to_string())
}

#[async_trait]
impl DutyBackend for MockBackend {
    fn base_url(&self) -> &str {
        "http://mock:8080"
    }

    async fn chat(&self, request: &ChatRequest, _client_info: &ClientInfo) -> Result<ChatAnswer> {
        self.chat_requests.lock().push(request.clone());

        let delay = *self.chat_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let reply = self.chat_replies.lock().pop_front();
        match reply {
            Some(ChatReply::Answer(answer)) => Ok(ChatAnswer { answer }),
            Some(ChatReply::Status(status)) => Err(ClientError::Api {
                status,
                message: "mock failure".to_string(),
            }),
            Some(ChatReply::Malformed) => {
                Err(ClientError::Decode("missing field `answer`".to_string()))
            }
            Some(ChatReply::Unreachable) => Err(unreachable()),
            None => Ok(ChatAnswer {
                answer: "mock answer".to_string(),
            }),
        }
    }

    async fn departments(&self) -> Result<DepartmentsResponse> {
        let delay = *self.departments_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let reply = self.departments.lock().clone();
        match reply {
            DepartmentsReply::List(departments) => Ok(DepartmentsResponse {
                status: "success".to_string(),
                departments,
                message: None,
            }),
            DepartmentsReply::Refused(message) => Ok(DepartmentsResponse {
                status: "error".to_string(),
                departments: Vec::new(),
                message: Some(message),
            }),
            DepartmentsReply::Unreachable => Err(unreachable()),
        }
    }

    async fn start_update(&self) -> Result<UpdateStartResponse> {
        let delay = *self.start_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let reply = self.start.lock().clone();
        match reply {
            StartReply::Started => Ok(UpdateStartResponse {
                status: "started".to_string(),
                message: None,
            }),
            StartReply::Refused(message) => Ok(UpdateStartResponse {
                status: "error".to_string(),
                message: Some(message),
            }),
            StartReply::Status(status) => Err(ClientError::Api {
                status,
                message: "mock failure".to_string(),
            }),
            StartReply::Unreachable => Err(unreachable()),
        }
    }

    async fn update_progress(&self) -> Result<UpdateProgress> {
        self.progress_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.progress.lock().pop_front();
        match reply {
            Some(ProgressReply::Progress(progress)) => Ok(progress),
            Some(ProgressReply::Unreachable) => Err(unreachable()),
            None => Ok(UpdateProgress::running(50, "임베딩 중")),
        }
    }
}

fn progress(status: UpdateStatus, percent: u8, message: &str) -> ProgressReply {
    ProgressReply::Progress(UpdateProgress {
        status,
        progress: percent,
        message: message.to_string(),
    })
}

#[cfg(test)]
mod conversation_tests {
    use super::*;
    use oncall_client::{
        load_with_watchdog, ConversationController, DirectorySource, HttpBackend, SendOutcome,
    };
    use oncall_core::{texts, Sender};
    use oncall_session::{KeyValueStorage, MemoryStorage, SessionStore, SESSION_STORAGE_KEY};
    use std::sync::atomic::AtomicBool;

    async fn controller_with(mock: Arc<MockBackend>) -> (ConversationController, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let session = SessionStore::open(storage.clone()).await.unwrap();
        let backend: Arc<dyn DutyBackend> = mock;
        (ConversationController::new(backend, session), storage)
    }

    #[tokio::test]
    async fn test_starts_with_welcome() {
        let (controller, _) = controller_with(Arc::new(MockBackend::new())).await;
        let messages = controller.messages();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, Sender::Bot);
        assert_eq!(messages[0].text, texts::WELCOME);
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let mock = Arc::new(MockBackend::new());
        let (controller, _) = controller_with(mock.clone()).await;

        assert_eq!(controller.send_message("   ").await, SendOutcome::Ignored);
        assert_eq!(controller.messages().len(), 1);
        assert!(mock.chat_requests().is_empty());
    }

    #[tokio::test]
    async fn test_out_of_domain_never_reaches_backend() {
        let mock = Arc::new(MockBackend::new());
        let (controller, _) = controller_with(mock.clone()).await;

        assert_eq!(controller.send_message("asdf").await, SendOutcome::OutOfDomain);

        let messages = controller.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].text, "asdf");
        assert_eq!(messages[2].text, texts::OUT_OF_DOMAIN_GUIDANCE);
        assert!(mock.chat_requests().is_empty());
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn test_answer_is_appended_verbatim() {
        let mock = Arc::new(MockBackend::new());
        mock.push_chat(ChatReply::Answer("외과 당직의는 김철수입니다.".to_string()));
        let (controller, _) = controller_with(mock.clone()).await;

        let outcome = controller.send_message("오늘 외과 당직 누구야?").await;

        assert_eq!(outcome, SendOutcome::Answered);
        let messages = controller.messages();
        assert_eq!(messages.last().unwrap().text, "외과 당직의는 김철수입니다.");

        let requests = mock.chat_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].message, "오늘 외과 당직 누구야?");
        assert_eq!(requests[0].session_id, controller.session_id().await);
    }

    #[tokio::test]
    async fn test_no_result_answer_gets_retry_guidance() {
        let mock = Arc::new(MockBackend::new());
        mock.push_chat(ChatReply::Answer("해당 정보를 찾을 수 없습니다.".to_string()));
        let (controller, _) = controller_with(mock).await;

        let outcome = controller.send_message("내일 소아과 당직").await;

        assert_eq!(outcome, SendOutcome::Augmented);
        let last = controller.messages().pop().unwrap();
        assert!(last.text.starts_with("해당 정보를 찾을 수 없습니다."));
        assert!(last.text.ends_with(texts::RETRY_GUIDANCE));
    }

    #[tokio::test]
    async fn test_server_error_sets_connection_flag_until_next_success() {
        let mock = Arc::new(MockBackend::new());
        mock.push_chat(ChatReply::Status(500));
        mock.push_chat(ChatReply::Answer("내과 당직의는 이영희입니다.".to_string()));
        let (controller, _) = controller_with(mock).await;

        assert_eq!(controller.send_message("내과 당직").await, SendOutcome::Failed);
        let state = controller.state();
        assert!(state.connection_error);
        assert!(!state.loading);
        assert_eq!(state.messages.last().unwrap().text, "서버 오류: HTTP 500");

        assert_eq!(controller.send_message("내과 당직").await, SendOutcome::Answered);
        assert!(!controller.state().connection_error);
    }

    #[tokio::test]
    async fn test_unreachable_backend_names_base_url() {
        let mock = Arc::new(MockBackend::new());
        mock.push_chat(ChatReply::Unreachable);
        let (controller, _) = controller_with(mock).await;

        assert_eq!(controller.send_message("외과 연락처").await, SendOutcome::Failed);
        let last = controller.messages().pop().unwrap();
        assert_eq!(last.text, texts::unreachable_backend("http://mock:8080"));
        assert!(controller.state().connection_error);
    }

    #[tokio::test]
    async fn test_unusable_reply_is_a_server_error() {
        let mock = Arc::new(MockBackend::new());
        mock.push_chat(ChatReply::Malformed);
        let (controller, _) = controller_with(mock).await;

        assert_eq!(controller.send_message("외과 당직").await, SendOutcome::Failed);
        let last = controller.messages().pop().unwrap();
        assert_eq!(last.text, texts::server_error_detail(texts::MALFORMED_RESPONSE));
        assert!(!last.text.contains("연결할 수 없습니다"));
        assert!(controller.state().connection_error);
    }

    #[tokio::test]
    async fn test_html_reply_over_http_is_a_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let storage = Arc::new(MemoryStorage::new());
        let session = SessionStore::open(storage).await.unwrap();
        let backend: Arc<dyn DutyBackend> = Arc::new(HttpBackend::new(&server.url()).unwrap());
        let controller = ConversationController::new(backend, session);

        assert_eq!(controller.send_message("오늘 외과 당직 누구야?").await, SendOutcome::Failed);
        let last = controller.messages().pop().unwrap();
        assert!(last.text.starts_with("서버 오류"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_send_while_loading_is_busy() {
        let mock = Arc::new(MockBackend::new());
        mock.set_chat_delay(Duration::from_secs(1));
        let (controller, _) = controller_with(mock.clone()).await;
        let controller = Arc::new(controller);

        let first = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.send_message("외과 당직").await })
        };
        while !controller.is_loading() {
            tokio::task::yield_now().await;
        }

        assert_eq!(controller.send_message("내과 당직").await, SendOutcome::Busy);
        assert_eq!(first.await.unwrap(), SendOutcome::Answered);
        assert_eq!(mock.chat_requests().len(), 1);
        // welcome, one user message, one answer
        assert_eq!(controller.messages().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_discards_pending_reply() {
        let mock = Arc::new(MockBackend::new());
        mock.set_chat_delay(Duration::from_secs(30));
        let (controller, _) = controller_with(mock).await;
        let controller = Arc::new(controller);

        let pending = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.send_message("외과 당직").await })
        };
        while !controller.is_loading() {
            tokio::task::yield_now().await;
        }
        controller.shutdown();

        assert_eq!(pending.await.unwrap(), SendOutcome::Discarded);
        let state = controller.state();
        assert!(!state.loading);
        assert_eq!(state.messages.last().unwrap().text, "외과 당직");
    }

    #[tokio::test]
    async fn test_reset_session_rotates_id_and_clears_history() {
        let mock = Arc::new(MockBackend::new());
        let (controller, storage) = controller_with(mock).await;
        controller.send_message("외과 당직").await;
        let old_id = controller.session_id().await;

        let new_id = controller.reset_session().await.unwrap();

        assert_ne!(old_id, new_id);
        assert!(controller.messages().is_empty());
        assert_eq!(
            storage.get(SESSION_STORAGE_KEY).await.unwrap().as_deref(),
            Some(new_id.as_str())
        );
    }

    #[tokio::test]
    async fn test_initialize_uses_backend_list() {
        let mock = Arc::new(MockBackend::new());
        let (controller, _) = controller_with(mock).await;

        let load = controller.initialize(Duration::from_secs(5)).await;

        assert_eq!(load.source, DirectorySource::Backend);
        assert_eq!(controller.departments().names(), ["외과", "내과"]);
        assert!(!controller.state().connection_error);
    }

    #[tokio::test]
    async fn test_refused_list_falls_back_without_connection_error() {
        let mock = Arc::new(MockBackend::new());
        mock.set_departments(DepartmentsReply::Refused("db offline".to_string()));
        let (controller, _) = controller_with(mock).await;

        let load = controller.initialize(Duration::from_secs(5)).await;

        assert_eq!(load.source, DirectorySource::Fallback);
        assert_eq!(controller.departments().len(), 6);
        assert!(!controller.state().connection_error);
    }

    #[tokio::test]
    async fn test_retry_connection_counts_attempts_and_recovers() {
        let mock = Arc::new(MockBackend::new());
        mock.set_departments(DepartmentsReply::Unreachable);
        let (controller, _) = controller_with(mock.clone()).await;

        controller.initialize(Duration::from_secs(5)).await;
        assert!(controller.state().connection_error);

        controller.retry_connection().await;
        controller.retry_connection().await;
        let state = controller.state();
        assert_eq!(state.retry_count, 2);
        assert!(state.connection_error);
        assert_eq!(state.departments.len(), 6);

        mock.set_departments(DepartmentsReply::List(vec!["응급의학과".to_string()]));
        let load = controller.retry_connection().await;
        let state = controller.state();
        assert_eq!(load.source, DirectorySource::Backend);
        assert_eq!(state.retry_count, 0);
        assert!(!state.connection_error);
        assert_eq!(state.departments.names(), ["응급의학과"]);
    }

    #[tokio::test]
    async fn test_failed_reindex_marks_chat_disconnected_until_retry() {
        let mock = Arc::new(MockBackend::new());
        mock.set_start(StartReply::Unreachable);
        let (controller, _) = controller_with(mock.clone()).await;
        controller.initialize(Duration::from_secs(5)).await;
        assert!(!controller.state().connection_error);

        let backend: Arc<dyn DutyBackend> = mock.clone();
        let poller = oncall_client::UpdateProgressPoller::new(backend, Default::default());
        poller.start().await;
        if poller.snapshot().connection_error {
            controller.mark_disconnected();
        }
        assert!(controller.state().connection_error);

        let load = controller.retry_connection().await;
        assert_eq!(load.source, DirectorySource::Backend);
        assert!(!controller.state().connection_error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_fires_but_load_completes() {
        let mock = Arc::new(MockBackend::new());
        mock.set_departments_delay(Duration::from_secs(8));
        let stalled = AtomicBool::new(false);

        let load = load_with_watchdog(mock.as_ref(), Duration::from_secs(5), || {
            stalled.store(true, Ordering::SeqCst);
        })
        .await;

        assert!(stalled.load(Ordering::SeqCst));
        assert_eq!(load.source, DirectorySource::Backend);
        assert!(!load.connection_error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_quiet_for_fast_backend() {
        let mock = Arc::new(MockBackend::new());
        mock.set_departments_delay(Duration::from_secs(1));
        let stalled = AtomicBool::new(false);

        load_with_watchdog(mock.as_ref(), Duration::from_secs(5), || {
            stalled.store(true, Ordering::SeqCst);
        })
        .await;

        assert!(!stalled.load(Ordering::SeqCst));
    }
}

#[cfg(test)]
mod poller_tests {
    use super::*;
    use oncall_client::{PollerSettings, StartOutcome, UpdateProgressPoller};
    use oncall_core::texts;

    fn poller_with(mock: Arc<MockBackend>) -> UpdateProgressPoller {
        let backend: Arc<dyn DutyBackend> = mock;
        UpdateProgressPoller::new(backend, PollerSettings::default())
    }

    async fn advance(millis: u64) {
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_job_runs_to_completion_then_idles() {
        let mock = Arc::new(MockBackend::new());
        mock.push_progress(progress(UpdateStatus::Running, 30, "문서 읽는 중"));
        mock.push_progress(progress(UpdateStatus::Running, 80, "임베딩 중"));
        mock.push_progress(progress(UpdateStatus::Completed, 100, "완료"));
        let poller = poller_with(mock.clone());

        assert_eq!(poller.start().await, StartOutcome::Started);
        let snapshot = poller.snapshot();
        assert!(snapshot.polling);
        assert!(snapshot.status_line.ends_with("데이터 업데이트 중..."));
        assert_eq!(snapshot.progress.message, texts::UPDATE_STARTING);

        advance(1100).await;
        let snapshot = poller.snapshot();
        assert_eq!(snapshot.progress.progress, 80);
        assert_eq!(snapshot.progress.message, "임베딩 중");

        advance(500).await;
        let snapshot = poller.snapshot();
        assert_eq!(snapshot.status_line, texts::UPDATE_COMPLETED);
        assert!(!snapshot.polling);

        advance(3000).await;
        assert_eq!(poller.snapshot().progress.status, UpdateStatus::Idle);
        assert_eq!(mock.progress_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_while_running_is_refused() {
        let mock = Arc::new(MockBackend::new());
        let poller = poller_with(mock);

        assert_eq!(poller.start().await, StartOutcome::Started);
        assert_eq!(poller.start().await, StartOutcome::AlreadyRunning);
        poller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_refused_start_reports_backend_message() {
        let mock = Arc::new(MockBackend::new());
        mock.set_start(StartReply::Refused("이미 실행 중".to_string()));
        let poller = poller_with(mock.clone());

        assert_eq!(
            poller.start().await,
            StartOutcome::Rejected("이미 실행 중".to_string())
        );
        assert_eq!(poller.snapshot().status_line, texts::update_failed("이미 실행 중"));

        advance(5100).await;
        assert_eq!(poller.snapshot().progress.status, UpdateStatus::Idle);
        assert_eq!(mock.progress_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_start() {
        let mock = Arc::new(MockBackend::new());
        mock.set_start(StartReply::Unreachable);
        let poller = poller_with(mock);

        assert_eq!(poller.start().await, StartOutcome::Unreachable);
        let snapshot = poller.snapshot();
        assert_eq!(snapshot.status_line, texts::UPDATE_UNREACHABLE);
        assert!(snapshot.connection_error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_error_status_reports_failure() {
        let mock = Arc::new(MockBackend::new());
        mock.set_start(StartReply::Status(503));
        let poller = poller_with(mock);

        let outcome = poller.start().await;
        assert!(matches!(outcome, StartOutcome::Failed(ref message) if message.contains("503")));
        let snapshot = poller.snapshot();
        assert!(snapshot.status_line.starts_with(&texts::update_failed("")));
        assert_ne!(snapshot.status_line, texts::UPDATE_UNREACHABLE);
        assert!(!snapshot.polling);

        advance(5100).await;
        assert_eq!(poller.snapshot().progress.status, UpdateStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_during_dwell_survives_slow_start() {
        let mock = Arc::new(MockBackend::new());
        mock.set_start_delay(Duration::from_millis(1000));
        mock.push_progress(progress(UpdateStatus::Completed, 100, "완료"));
        let poller = Arc::new(poller_with(mock));

        assert_eq!(poller.start().await, StartOutcome::Started);
        advance(600).await;
        assert_eq!(poller.snapshot().status_line, texts::UPDATE_COMPLETED);

        // the old success dwell would end while the new start is in flight
        advance(2500).await;
        let restarted = {
            let poller = poller.clone();
            tokio::spawn(async move { poller.start().await })
        };
        while !poller.snapshot().polling {
            tokio::task::yield_now().await;
        }

        assert_eq!(poller.start().await, StartOutcome::AlreadyRunning);
        assert_eq!(restarted.await.unwrap(), StartOutcome::Started);

        let snapshot = poller.snapshot();
        assert!(snapshot.polling);
        assert_eq!(snapshot.progress.status, UpdateStatus::Running);

        advance(600).await;
        assert!(poller.snapshot().polling);
        poller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_failure_is_not_retried() {
        let mock = Arc::new(MockBackend::new());
        mock.push_progress(ProgressReply::Unreachable);
        let poller = poller_with(mock.clone());

        poller.start().await;
        advance(600).await;
        let snapshot = poller.snapshot();
        assert_eq!(snapshot.status_line, texts::UPDATE_CONNECTION_FAILED);
        assert!(snapshot.connection_error);

        advance(10_000).await;
        assert_eq!(mock.progress_calls(), 1);
        assert_eq!(poller.snapshot().progress.status, UpdateStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_job_error_dwells_then_idles() {
        let mock = Arc::new(MockBackend::new());
        mock.push_progress(progress(UpdateStatus::Error, 40, "디스크 부족"));
        let poller = poller_with(mock);

        poller.start().await;
        advance(600).await;
        assert_eq!(poller.snapshot().status_line, texts::update_failed("디스크 부족"));

        advance(4000).await;
        assert_eq!(poller.snapshot().progress.status, UpdateStatus::Error);

        advance(1000).await;
        assert_eq!(poller.snapshot().progress.status, UpdateStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_report_keeps_polling() {
        let mock = Arc::new(MockBackend::new());
        mock.push_progress(ProgressReply::Progress(UpdateProgress::idle()));
        let poller = poller_with(mock.clone());

        poller.start().await;
        advance(1100).await;

        assert_eq!(mock.progress_calls(), 2);
        assert!(poller.snapshot().polling);
        poller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_polling() {
        let mock = Arc::new(MockBackend::new());
        let poller = poller_with(mock.clone());

        poller.start().await;
        advance(1100).await;
        assert_eq!(mock.progress_calls(), 2);

        poller.stop();
        assert!(!poller.snapshot().polling);
        advance(5000).await;
        assert_eq!(mock.progress_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_halts_polling() {
        let mock = Arc::new(MockBackend::new());
        let poller = poller_with(mock.clone());

        poller.start().await;
        advance(600).await;
        drop(poller);

        advance(5000).await;
        assert_eq!(mock.progress_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_completion() {
        let mock = Arc::new(MockBackend::new());
        mock.push_progress(progress(UpdateStatus::Completed, 100, "완료"));
        let poller = poller_with(mock.clone());

        poller.start().await;
        advance(600).await;
        assert!(!poller.snapshot().polling);

        // still dwelling on the completed state
        assert_eq!(poller.start().await, StartOutcome::Started);
        advance(3000).await;
        assert!(poller.snapshot().polling);
        poller.stop();
    }
}

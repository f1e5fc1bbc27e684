//! Drives a backend reindex and follows its progress until it settles.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Local};
use oncall_core::{texts, UpdateProgress, UpdateStatus};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::backend::DutyBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerSettings {
    pub interval: Duration,
    pub success_dwell: Duration,
    pub error_dwell: Duration,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            success_dwell: Duration::from_secs(3),
            error_dwell: Duration::from_secs(5),
        }
    }
}

/// Published view of the update job
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PollerSnapshot {
    pub progress: UpdateProgress,
    pub status_line: String,
    /// A job is being started or followed
    pub polling: bool,
    /// Last poll could not reach the backend
    pub connection_error: bool,
}

impl PollerSnapshot {
    pub fn is_active(&self) -> bool {
        self.polling
    }

    fn failed(message: &str, connection_error: bool) -> Self {
        let line = texts::update_failed(message);
        Self {
            progress: UpdateProgress {
                status: UpdateStatus::Error,
                progress: 0,
                message: line.clone(),
            },
            status_line: line,
            polling: false,
            connection_error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
    /// Backend refused to start; carries its message
    Rejected(String),
    /// Backend answered with an error status or an unreadable body
    Failed(String),
    Unreachable,
}

/// Snapshot writer owned by one run.
///
/// Writes are dropped once the run's token is cancelled. The check happens
/// under the channel lock, so a superseded run can never overwrite the
/// snapshot of the run that replaced it.
#[derive(Clone)]
struct RunPublisher {
    tx: Arc<watch::Sender<PollerSnapshot>>,
    token: CancellationToken,
}

impl RunPublisher {
    fn publish(&self, snapshot: PollerSnapshot) -> bool {
        self.update(|current| *current = snapshot)
    }

    fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut PollerSnapshot),
    {
        self.tx.send_if_modified(|current| {
            if self.token.is_cancelled() {
                return false;
            }
            f(current);
            true
        })
    }
}

pub struct UpdateProgressPoller {
    backend: Arc<dyn DutyBackend>,
    settings: PollerSettings,
    tx: Arc<watch::Sender<PollerSnapshot>>,
    shutdown: CancellationToken,
    run: Mutex<Option<CancellationToken>>,
}

impl UpdateProgressPoller {
    pub fn new(backend: Arc<dyn DutyBackend>, settings: PollerSettings) -> Self {
        let (tx, _rx) = watch::channel(PollerSnapshot::default());
        Self {
            backend,
            settings,
            tx: Arc::new(tx),
            shutdown: CancellationToken::new(),
            run: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PollerSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> PollerSnapshot {
        self.tx.borrow().clone()
    }

    /// Claim the poller for a new run, retiring the previous run's dwell.
    ///
    /// `None` while a job is still being started or followed.
    fn claim(&self) -> Option<RunPublisher> {
        let now = Local::now();
        let token = self.shutdown.child_token();
        let mut run = self.run.lock();

        let claimed = self.tx.send_if_modified(|current| {
            if current.polling {
                return false;
            }
            if let Some(previous) = run.take() {
                previous.cancel();
            }
            *current = PollerSnapshot {
                progress: UpdateProgress::running(0, texts::UPDATE_STARTING),
                status_line: texts::update_in_progress(now.year(), now.month()),
                polling: true,
                connection_error: false,
            };
            true
        });

        if !claimed {
            return None;
        }
        *run = Some(token.clone());
        Some(RunPublisher {
            tx: Arc::clone(&self.tx),
            token,
        })
    }

    /// Ask the backend to reindex and start following it
    pub async fn start(&self) -> StartOutcome {
        let Some(publisher) = self.claim() else {
            return StartOutcome::AlreadyRunning;
        };

        match self.backend.start_update().await {
            Ok(response) if response.is_started() => {
                tracing::info!("Update job started");
                tokio::spawn(poll_until_settled(
                    Arc::clone(&self.backend),
                    publisher,
                    self.settings,
                ));
                StartOutcome::Started
            }
            Ok(response) => {
                let message = response.message.unwrap_or_default();
                tracing::warn!(status = %response.status, %message, "Update job refused");
                publisher.publish(PollerSnapshot::failed(&message, false));
                tokio::spawn(reset_after(publisher, self.settings.error_dwell));
                StartOutcome::Rejected(message)
            }
            Err(e) if e.is_unreachable() => {
                tracing::error!(error = %e, "Update server unreachable");
                publisher.publish(PollerSnapshot {
                    progress: UpdateProgress {
                        status: UpdateStatus::Error,
                        progress: 0,
                        message: texts::UPDATE_UNREACHABLE.to_string(),
                    },
                    status_line: texts::UPDATE_UNREACHABLE.to_string(),
                    polling: false,
                    connection_error: true,
                });
                tokio::spawn(reset_after(publisher, self.settings.error_dwell));
                StartOutcome::Unreachable
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to start update job");
                let message = e.to_string();
                publisher.publish(PollerSnapshot::failed(&message, true));
                tokio::spawn(reset_after(publisher, self.settings.error_dwell));
                StartOutcome::Failed(message)
            }
        }
    }

    /// Cancel the current job follow-up and return to idle
    pub fn stop(&self) {
        if let Some(token) = self.run.lock().take() {
            token.cancel();
        }
        self.tx.send_replace(PollerSnapshot::default());
    }
}

impl Drop for UpdateProgressPoller {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn poll_until_settled(
    backend: Arc<dyn DutyBackend>,
    publisher: RunPublisher,
    settings: PollerSettings,
) {
    loop {
        if !sleep_or_cancel(settings.interval, &publisher.token).await {
            return;
        }

        let result = tokio::select! {
            result = backend.update_progress() => result,
            _ = publisher.token.cancelled() => return,
        };

        match result {
            Ok(progress) => match progress.status {
                UpdateStatus::Completed => {
                    tracing::info!("Update job completed");
                    publisher.publish(PollerSnapshot {
                        progress,
                        status_line: texts::UPDATE_COMPLETED.to_string(),
                        polling: false,
                        connection_error: false,
                    });
                    reset_after(publisher, settings.success_dwell).await;
                    return;
                }
                UpdateStatus::Error => {
                    tracing::warn!(message = %progress.message, "Update job failed");
                    publisher.publish(PollerSnapshot::failed(&progress.message, false));
                    reset_after(publisher, settings.error_dwell).await;
                    return;
                }
                UpdateStatus::Running | UpdateStatus::Idle => {
                    tracing::debug!(progress = progress.progress, "Update job in progress");
                    publisher.update(|snapshot| {
                        snapshot.progress = UpdateProgress {
                            status: UpdateStatus::Running,
                            ..progress
                        };
                    });
                }
            },
            Err(e) => {
                tracing::error!(error = %e, "Progress poll failed");
                publisher.publish(PollerSnapshot {
                    progress: UpdateProgress {
                        status: UpdateStatus::Error,
                        progress: 0,
                        message: texts::UPDATE_CONNECTION_FAILED.to_string(),
                    },
                    status_line: texts::UPDATE_CONNECTION_FAILED.to_string(),
                    polling: false,
                    connection_error: true,
                });
                reset_after(publisher, settings.error_dwell).await;
                return;
            }
        }
    }
}

async fn reset_after(publisher: RunPublisher, dwell: Duration) {
    if sleep_or_cancel(dwell, &publisher.token).await {
        publisher.publish(PollerSnapshot::default());
    }
}

/// false when cancelled first
async fn sleep_or_cancel(duration: Duration, token: &CancellationToken) -> bool {
    if token.is_cancelled() {
        return false;
    }
    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = token.cancelled() => false,
    }
}

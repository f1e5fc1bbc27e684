//! Department directory loading with fallback and a startup watchdog.

use std::time::Duration;

use oncall_core::DepartmentDirectory;

use crate::backend::DutyBackend;

pub const DEFAULT_WATCHDOG: Duration = Duration::from_secs(5);

/// Where a loaded directory came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectorySource {
    Backend,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryLoad {
    pub directory: DepartmentDirectory,
    pub source: DirectorySource,
    /// Set only when the backend could not be talked to
    pub connection_error: bool,
}

impl DirectoryLoad {
    fn fallback(connection_error: bool) -> Self {
        Self {
            directory: DepartmentDirectory::fallback(),
            source: DirectorySource::Fallback,
            connection_error,
        }
    }
}

/// Fetch the department list, falling back to the built-in names.
///
/// A backend that answers with a non-success status is reachable, so only
/// request failures raise the connection flag.
pub async fn load_departments(backend: &dyn DutyBackend) -> DirectoryLoad {
    match backend.departments().await {
        Ok(response) if response.is_success() => {
            tracing::info!(count = response.departments.len(), "Loaded departments");
            DirectoryLoad {
                directory: DepartmentDirectory::new(response.departments),
                source: DirectorySource::Backend,
                connection_error: false,
            }
        }
        Ok(response) => {
            tracing::warn!(
                status = %response.status,
                message = response.message.as_deref().unwrap_or(""),
                "Department list unavailable, using fallback"
            );
            DirectoryLoad::fallback(false)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load departments, using fallback");
            DirectoryLoad::fallback(true)
        }
    }
}

/// Like [`load_departments`], calling `on_stall` once if the load is still
/// pending after `watchdog`. The request itself keeps running.
pub async fn load_with_watchdog<F>(
    backend: &dyn DutyBackend,
    watchdog: Duration,
    on_stall: F,
) -> DirectoryLoad
where
    F: FnOnce(),
{
    let load = load_departments(backend);
    tokio::pin!(load);

    tokio::select! {
        result = &mut load => return result,
        _ = tokio::time::sleep(watchdog) => {
            tracing::warn!(watchdog_secs = watchdog.as_secs(), "Department load still pending");
            on_stall();
        }
    }

    load.await
}

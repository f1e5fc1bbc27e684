//! Structured logging built on tracing.
//!
//! Console output goes to stderr so it never interleaves with chat output
//! on stdout. File output is JSON, rolled daily.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use oncall_config::{expand_tilde, LoggingConfig};
use parking_lot::RwLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt,
    layer::{Layered, SubscriberExt},
    reload::{self, Handle},
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::error::{ObservabilityError, Result};

type ReloadHandle = Handle<EnvFilter, Registry>;
type Base = Layered<reload::Layer<EnvFilter, Registry>, Registry>;

pub const LOG_FILE_PREFIX: &str = "oncall.log";

/// Chatty dependencies kept at warn unless asked for explicitly
const QUIET_MODULES: &[&str] = &["hyper", "hyper_util", "reqwest", "rustls", "h2"];

/// Where log records go
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Overrides the configured level, e.g. from `--debug`
    pub level_override: Option<String>,
    /// Write human-readable (or JSON) records to stderr
    pub console: bool,
}

#[derive(Debug)]
pub struct LogManager {
    level: String,
    log_dir: Option<PathBuf>,
    reload_handle: Arc<RwLock<ReloadHandle>>,
    // flushes the file writer on drop
    _file_guard: Option<WorkerGuard>,
}

impl LogManager {
    /// Install the global subscriber. Fails if one is already installed.
    pub fn init(config: &LoggingConfig, options: LogOptions) -> Result<Self> {
        let level = options
            .level_override
            .clone()
            .unwrap_or_else(|| config.level.to_string());

        let filter = build_filter(&level)?;
        let (filter, reload_handle) = reload::Layer::new(filter);

        let console: Option<Box<dyn Layer<Base> + Send + Sync>> = if options.console {
            if config.json {
                Some(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .boxed(),
                )
            } else {
                Some(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(false)
                        .boxed(),
                )
            }
        } else {
            None
        };

        let log_dir = config.file.as_deref().and_then(expand_tilde);
        let (file_layer, file_guard) = match &log_dir {
            Some(dir) => {
                let (writer, guard) = file_writer(dir)?;
                let layer = fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_line_number(true)
                    .with_file(true);
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .with(file_layer)
            .try_init()
            .map_err(|e| ObservabilityError::logging(format!("Failed to install subscriber: {}", e)))?;

        tracing::info!(
            target: "oncall_observability",
            level = %level,
            log_dir = ?log_dir,
            "Log manager initialized"
        );

        Ok(Self {
            level,
            log_dir,
            reload_handle: Arc::new(RwLock::new(reload_handle)),
            _file_guard: file_guard,
        })
    }

    /// Swap the active filter without reinstalling the subscriber
    pub fn update_level(&mut self, level: &str) -> Result<()> {
        let new_filter = filter_for_level(level)?;

        self.reload_handle
            .write()
            .modify(|filter| *filter = new_filter)
            .map_err(|e| ObservabilityError::logging(format!("Failed to update log level: {}", e)))?;

        self.level = level.to_string();
        tracing::info!(target: "oncall_observability", "Log level updated to: {}", level);
        Ok(())
    }

    pub fn level(&self) -> &str {
        &self.level
    }

    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

/// `RUST_LOG` wins over the configured level when set
pub fn build_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    filter_for_level(level)
}

fn filter_for_level(level: &str) -> Result<EnvFilter> {
    let mut filter = EnvFilter::try_new(level)
        .map_err(|e| ObservabilityError::logging(format!("Invalid log level: {}", e)))?;

    for module in QUIET_MODULES {
        filter = filter.add_directive(
            format!("{}=warn", module)
                .parse()
                .map_err(|e| ObservabilityError::logging(format!("Invalid directive: {}", e)))?,
        );
    }

    Ok(filter)
}

fn file_writer(dir: &Path) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    Ok(tracing_appender::non_blocking(appender))
}

/// Span carrying the conversation session id
pub fn create_session_span(session_id: &str) -> tracing::Span {
    tracing::info_span!("session", session_id = %session_id)
}

/// Span for one reindex run
pub fn create_update_span(base_url: &str) -> tracing::Span {
    tracing::info_span!("update", base_url = %base_url)
}

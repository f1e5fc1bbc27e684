//! Logging setup shared by the on-call binaries.

pub mod error;
pub mod logging;

pub use error::{ObservabilityError, Result};
pub use logging::{
    build_filter, create_session_span, create_update_span, LogManager, LogOptions,
    LOG_FILE_PREFIX,
};


use oncall_session::StorageError;
use thiserror::Error;

/// Errors talking to the backend
#[derive(Error, Debug)]
pub enum ClientError {
    /// The backend could not be reached at all
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status
    #[error("api error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The backend answered 2xx with a body we cannot read
    #[error("decode error: {0}")]
    Decode(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("config error: {0}")]
    Config(String),
}

impl ClientError {
    pub fn is_unreachable(&self) -> bool {
        matches!(self, ClientError::Network(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

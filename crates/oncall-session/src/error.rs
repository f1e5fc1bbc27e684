//! # Storage Error Types

use thiserror::Error;

/// Errors raised by key/value storage
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The storage file exists but is not a JSON object of strings
    #[error("Corrupt storage file {path}: {message}")]
    Corrupt { path: String, message: String },
}

pub type StorageResult<T> = Result<T, StorageError>;

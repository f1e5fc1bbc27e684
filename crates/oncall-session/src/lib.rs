//! # On-call Session Identity
//!
//! Keeps one opaque session identifier per client profile so the backend can
//! correlate conversation turns across restarts.
//!
//! ## Storage layout
//!
//! ```text
//! ~/.oncall/storage.json
//! {
//!   "chatbot_session_id": "6f1c2d9e-…"
//! }
//! ```
//!
//! The identifier is created on first use, read back verbatim afterwards,
//! and replaced only by an explicit [`SessionStore::reset`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use oncall_session::{FileStorage, SessionStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let storage = Arc::new(FileStorage::new("/home/me/.oncall/storage.json"));
//!     let mut store = SessionStore::open(storage).await?;
//!     println!("session: {}", store.id());
//!     store.reset().await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod storage;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use store::{generate_session_id, SessionStore, SESSION_STORAGE_KEY};

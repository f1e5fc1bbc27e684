//! # Session Store

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};
use crate::storage::KeyValueStorage;

/// Storage key under which the session id is kept
pub const SESSION_STORAGE_KEY: &str = "chatbot_session_id";

/// New random version-4 UUID string
pub fn generate_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Owner of the current session id.
///
/// Only one store per profile should be live; it is the single writer of
/// [`SESSION_STORAGE_KEY`].
pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
    id: String,
}

impl SessionStore {
    /// Read the persisted id, creating and persisting one if absent.
    ///
    /// An unreadable storage file counts as absent; writing the new id
    /// replaces it.
    pub async fn open(storage: Arc<dyn KeyValueStorage>) -> StorageResult<Self> {
        let existing = match storage.get(SESSION_STORAGE_KEY).await {
            Ok(id) => id.filter(|id| !id.trim().is_empty()),
            Err(StorageError::Corrupt { path, message }) => {
                warn!("Unreadable session storage {}: {}, starting a new session", path, message);
                None
            }
            Err(e) => return Err(e),
        };

        let id = match existing {
            Some(id) => id,
            None => {
                let id = generate_session_id();
                storage.set(SESSION_STORAGE_KEY, &id).await?;
                info!(session_id = %id, "Created new session");
                id
            }
        };

        Ok(Self { storage, id })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Replace the id with a fresh one and persist it
    pub async fn reset(&mut self) -> StorageResult<&str> {
        let id = generate_session_id();
        self.storage.set(SESSION_STORAGE_KEY, &id).await?;
        info!(old_session_id = %self.id, session_id = %id, "Session reset");
        self.id = id;
        Ok(&self.id)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").field("id", &self.id).finish()
    }
}

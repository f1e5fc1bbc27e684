//! # Key/Value Storage
//!
//! String-to-string storage that survives restarts, the client counterpart of
//! browser-local storage.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{StorageError, StorageResult};

/// Persistent string values under fixed keys
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    async fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Values kept in a single JSON object file
pub struct FileStorage {
    path: PathBuf,
    // serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> StorageResult<BTreeMap<String, String>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| StorageError::Corrupt {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    async fn write_all(&self, values: &BTreeMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // write-then-rename: readers never see a partial file
        let tmp = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(values)?;
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let values = self.read_all().await?;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut values = match self.read_all().await {
            Ok(values) => values,
            Err(StorageError::Corrupt { path, message }) => {
                warn!("Overwriting corrupt storage file {}: {}", path, message);
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values).await?;
        debug!("Stored key {} in {:?}", key, self.path);
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut values = self.read_all().await?;
        if values.remove(key).is_some() {
            self.write_all(&values).await?;
        }
        Ok(())
    }
}

/// In-process storage; nothing survives the process
#[derive(Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.values.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_storage_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path().join("nested").join("storage.json"));

        assert_eq!(storage.get("k").await.unwrap(), None);
        storage.set("k", "v1").await.unwrap();
        storage.set("other", "x").await.unwrap();
        storage.set("k", "v2").await.unwrap();

        assert_eq!(storage.get("k").await.unwrap().as_deref(), Some("v2"));
        assert_eq!(storage.get("other").await.unwrap().as_deref(), Some("x"));

        storage.remove("k").await.unwrap();
        assert_eq!(storage.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_file_reported_then_overwritten() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        let storage = FileStorage::new(&path);
        assert!(matches!(
            storage.get("k").await,
            Err(StorageError::Corrupt { .. })
        ));

        storage.set("k", "v").await.unwrap();
        assert_eq!(storage.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_memory_storage() {
        tokio_test::block_on(async {
            let storage = MemoryStorage::new();
            storage.set("a", "1").await.unwrap();
            assert_eq!(storage.get("a").await.unwrap().as_deref(), Some("1"));
            storage.remove("a").await.unwrap();
            assert!(storage.get("a").await.unwrap().is_none());
        });
    }
}

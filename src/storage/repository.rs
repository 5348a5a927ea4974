use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::{errors::StorageError, keys::StorageKey};

/// Local key-value persistence holding one JSON document per key
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn load(&self, key: StorageKey) -> Result<Option<String>, StorageError>;
    async fn save(&self, key: StorageKey, value: String) -> Result<(), StorageError>;
    async fn remove(&self, key: StorageKey) -> Result<(), StorageError>;
}

/// In-memory implementation for development and testing. Contents are
/// lost when the store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: RwLock<HashMap<StorageKey, String>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with raw documents
    pub fn with_entries(entries: Vec<(StorageKey, String)>) -> Self {
        Self {
            entries: RwLock::new(entries.into_iter().collect()),
        }
    }

    pub async fn contains(&self, key: StorageKey) -> bool {
        self.entries.read().await.contains_key(&key)
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn load(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().await.get(&key).cloned())
    }

    async fn save(&self, key: StorageKey, value: String) -> Result<(), StorageError> {
        self.entries.write().await.insert(key, value);
        Ok(())
    }

    async fn remove(&self, key: StorageKey) -> Result<(), StorageError> {
        self.entries.write().await.remove(&key);
        Ok(())
    }
}

/// Stores each key as `<data_dir>/<key>.json`. Writes go through a
/// temporary file and a rename so a crash never leaves half a document.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    data_dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, key: StorageKey) -> PathBuf {
        self.data_dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    #[instrument(skip(self))]
    async fn load(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(key = %key, "No stored document");
                Ok(None)
            }
            Err(source) => Err(StorageError::Io { key, source }),
        }
    }

    #[instrument(skip(self, value), fields(bytes = value.len()))]
    async fn save(&self, key: StorageKey, value: String) -> Result<(), StorageError> {
        let io_error = |source| StorageError::Io { key, source };

        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(io_error)?;

        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, value).await.map_err(io_error)?;
        tokio::fs::rename(&staging, &path).await.map_err(io_error)?;

        debug!(key = %key, path = %path.display(), "Document written");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, key: StorageKey) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { key, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_store_round_trips_documents() {
        let store = InMemoryKeyValueStore::new();
        assert_eq!(store.load(StorageKey::Games).await.unwrap(), None);

        store.save(StorageKey::Games, "[]".into()).await.unwrap();
        assert_eq!(store.load(StorageKey::Games).await.unwrap().as_deref(), Some("[]"));

        store.remove(StorageKey::Games).await.unwrap();
        assert!(!store.contains(StorageKey::Games).await);
    }

    #[tokio::test]
    async fn file_store_writes_one_file_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::new(dir.path().join("nested"));

        store
            .save(StorageKey::SessionUserId, "\"u1\"".into())
            .await
            .unwrap();

        let on_disk = std::fs::read_to_string(dir.path().join("nested/session_user_id.json")).unwrap();
        assert_eq!(on_disk, "\"u1\"");
        assert_eq!(
            store.load(StorageKey::SessionUserId).await.unwrap().as_deref(),
            Some("\"u1\"")
        );
    }

    #[tokio::test]
    async fn file_store_treats_missing_files_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::new(dir.path());

        assert_eq!(store.load(StorageKey::Players).await.unwrap(), None);
        store.remove(StorageKey::Players).await.unwrap();
    }
}

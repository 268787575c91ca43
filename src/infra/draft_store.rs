//! Local key/value stores backing the draft and session slots.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::debug;

use crate::domain::{DraftStore, StorageError};
use crate::util::persistence::data_dir;

/// One JSON file per key under a base directory.
#[derive(Clone, Debug)]
pub struct FileDraftStore {
    base_dir: PathBuf,
}

impl FileDraftStore {
    /// Store rooted in the platform data directory.
    pub fn in_data_dir() -> Result<Self, StorageError> {
        let base_dir = data_dir().ok_or(StorageError::Unavailable)?;
        Self::create(base_dir)
    }

    /// Store rooted at `base_dir`, creating it if needed.
    pub fn create(base_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{key}.json"))
    }
}

impl DraftStore for FileDraftStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.file_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.file_path(key);
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, value)?;
        fs::rename(&temp_path, &path)?;
        debug!("[store] wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.file_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-process store, used when no data directory is available and in tests.
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryDraftStore {
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }

    fn poisoned() -> StorageError {
        StorageError::Other("memory store lock poisoned".to_string())
    }
}

impl DraftStore for MemoryDraftStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_roundtrip() {
        let temp_dir = tempfile::TempDir::new().expect("temp dir");
        let store = FileDraftStore::create(temp_dir.path()).expect("store");
        store.write("draft", "{\"productName\":\"x\"}").expect("write");
        assert_eq!(
            store.read("draft").expect("read").as_deref(),
            Some("{\"productName\":\"x\"}")
        );

        store.clear("draft").expect("clear");
        assert!(store.read("draft").expect("read").is_none());
    }

    #[test]
    fn clearing_missing_key_is_ok() {
        let temp_dir = tempfile::TempDir::new().expect("temp dir");
        let store = FileDraftStore::create(temp_dir.path().join("nested")).expect("store");
        store.clear("never-written").expect("clear");
        assert!(store.read("never-written").expect("read").is_none());
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryDraftStore::default();
        store.write("k", "v").expect("write");
        assert!(store.contains("k"));
        store.clear("k").expect("clear");
        assert!(!store.contains("k"));
    }
}

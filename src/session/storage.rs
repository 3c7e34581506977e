//! Durable storage backends for persisted chat state

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Error, Result};

/// Fixed key the chat state is persisted under. There is no
/// versioning or migration scheme; a schema change requires a key
/// rename.
pub const STORAGE_KEY: &str = "chat-storage";

/// A single-record key/value blob store. Writes are best-effort: the
/// session store logs save failures and carries on.
pub trait StateStorage {
    fn load(&self, key: &str) -> Result<Option<String>, Error>;
    fn save(&self, key: &str, value: &str) -> Result<(), Error>;
}

/// Stores each key as a JSON file under a base directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStorage { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl StateStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, Error> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn save(&self, key: &str, value: &str) -> Result<(), Error> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

/// In-memory backend used in tests.
#[derive(Default)]
pub struct MemoryStorage {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.records.lock().unwrap().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), Error> {
        self.records
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        assert!(storage.load("missing").unwrap().is_none());
        storage.save(STORAGE_KEY, "{\"sessions\":[]}").unwrap();
        assert_eq!(
            storage.load(STORAGE_KEY).unwrap().unwrap(),
            "{\"sessions\":[]}"
        );
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(storage.load(STORAGE_KEY).unwrap().is_none());
        storage.save(STORAGE_KEY, "hello").unwrap();
        assert_eq!(storage.load(STORAGE_KEY).unwrap().unwrap(), "hello");
    }

    #[test]
    fn test_file_storage_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("state");
        let storage = FileStorage::new(&nested);
        storage.save(STORAGE_KEY, "{}").unwrap();
        assert!(nested.join("chat-storage.json").exists());
    }
}

//! The persistence seam and its backends.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;
use uuid::Uuid;

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be read or written.
    #[error("failed to access persisted state: {0}")]
    Io(#[from] io::Error),
    /// A persisted blob could not be decoded.
    #[error("failed to decode persisted state: {0}")]
    Corrupt(#[from] serde_json::Error),
    /// The referenced conversation does not exist.
    #[error("no such conversation: {0}")]
    UnknownConversation(Uuid),
    /// The referenced message does not exist.
    #[error("no such message: {0}")]
    UnknownMessage(Uuid),
    /// The referenced assignment does not exist.
    #[error("no such assignment: {0}")]
    UnknownAssignment(Uuid),
}

/// A keyed blob store.
///
/// Writes are wholesale: the caller serializes a full collection and
/// the previous blob is replaced. Concurrent writers are resolved as
/// last-write-wins; a backend with per-record operations would plug in
/// here if that ever stops being acceptable.
pub trait StateStore: Send + Sync {
    /// Loads the blob stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Replaces the blob stored under `key`.
    fn save(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Removes the blob stored under `key`, if any.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// A [`StateStore`] that keeps one JSON file per key in a directory.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Opens a store rooted at `root`, creating the directory if
    /// needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl StateStore for FsStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.blob_path(key)) {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.blob_path(key);
        trace!("rewriting state blob at {}", path.display());
        fs::write(path, value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.blob_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

impl std::fmt::Debug for FsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsStore").field("root", &self.root).finish()
    }
}

/// An in-memory [`StateStore`] for tests and demos.
///
/// The mutex only exists to make the backend `Send + Sync`; all store
/// mutation happens on a single logical thread of control.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        let blobs = self.blobs.lock().unwrap_or_else(|err| err.into_inner());
        Ok(blobs.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut blobs =
            self.blobs.lock().unwrap_or_else(|err| err.into_inner());
        blobs.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut blobs =
            self.blobs.lock().unwrap_or_else(|err| err.into_inner());
        blobs.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path()).unwrap();

        assert!(store.load("conversations_u1").unwrap().is_none());
        store.save("conversations_u1", "[]").unwrap();
        assert_eq!(
            store.load("conversations_u1").unwrap().as_deref(),
            Some("[]")
        );

        store.save("conversations_u1", "[{}]").unwrap();
        assert_eq!(
            store.load("conversations_u1").unwrap().as_deref(),
            Some("[{}]")
        );

        store.remove("conversations_u1").unwrap();
        assert!(store.load("conversations_u1").unwrap().is_none());
        // Removing a missing key is not an error.
        store.remove("conversations_u1").unwrap();
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.load("users").unwrap().is_none());
        store.save("users", "[]").unwrap();
        assert_eq!(store.load("users").unwrap().as_deref(), Some("[]"));
        store.remove("users").unwrap();
        assert!(store.load("users").unwrap().is_none());
    }
}

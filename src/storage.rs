//! Key-value persistence adapters.
//!
//! The repository only ever needs `get`, `set` and `remove` on string keys.
//! [`MemoryStore`] keeps values in process; [`FileStore`] keeps one file per
//! key and replaces it atomically on every write.
use std::{
    collections::HashMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use log::{debug, error, info, trace};
use tempfile::NamedTempFile;

use crate::{NotesError, Result};

/// Key holding the JSON array of notes. Stable across app versions.
pub const NOTES_KEY: &str = "@notes_app_data";

/// Key holding the JSON settings object. Stable across app versions.
pub const SETTINGS_KEY: &str = "@notes_app_settings";

/// Minimal asynchronous key-value storage facility.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` if the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-process store backed by a shared map.
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| NotesError::LockAcquisitionFailed {
                message: "Failed to acquire lock on memory store".to_string(),
            })
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self.entries()?.get(key).cloned();
        trace!("MemoryStore get {}: present={}", key, value.is_some());
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        trace!("MemoryStore set {} ({} bytes)", key, value.len());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        trace!("MemoryStore removed {}", key);
        Ok(())
    }
}

/// Store keeping each key in its own file under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.exists() {
            debug!("Data directory does not exist, creating: {}", root.display());
            fs::create_dir_all(&root).map_err(|e| {
                error!("Failed to create data directory: {}", e);
                NotesError::DirectoryError { path: root.clone() }
            })?;
        }

        info!("Opened file store at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Helper method to get the file path for a key
    ///
    /// Lowercase ASCII letters, digits, `-` and `_` are kept; every other
    /// byte becomes `%XX`. Distinct keys therefore never share a file, even
    /// on case-insensitive filesystems.
    fn path_for(&self, key: &str) -> PathBuf {
        let mut stem = String::with_capacity(key.len());
        for byte in key.bytes() {
            match byte {
                b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' => stem.push(char::from(byte)),
                _ => stem.push_str(&format!("%{:02X}", byte)),
            }
        }

        self.root.join(format!("{}.json", stem))
    }
}

// Writes through a temporary file in the same directory, then renames over the target
fn write_atomically(path: &Path, value: &str) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp_file = NamedTempFile::new_in(dir).map_err(|e| {
        error!("Failed to create temporary file: {}", e);
        NotesError::Io(e)
    })?;

    temp_file.write_all(value.as_bytes())?;
    temp_file.flush()?;

    temp_file.persist(path).map_err(|e| {
        error!("Failed to persist file {}: {}", path.display(), e.error);
        NotesError::Io(e.error)
    })?;

    Ok(())
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        trace!("Reading {} from {}", key, path.display());

        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(NotesError::Storage {
                key: key.to_string(),
                message: format!("Failed to read {}: {}", path.display(), e),
            }),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let value = value.to_string();
        trace!("Writing {} to {}", key, path.display());

        tokio::task::spawn_blocking(move || write_atomically(&path, &value))
            .await
            .map_err(|e| NotesError::Storage {
                key: key.to_string(),
                message: format!("Write task failed: {}", e),
            })?
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        debug!("Removing {} at {}", key, path.display());

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(NotesError::Storage {
                key: key.to_string(),
                message: format!("Failed to remove {}: {}", path.display(), e),
            }),
        }
    }
}

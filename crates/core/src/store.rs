//! Key-value storage for the conversation history.

use std::collections::HashMap;
use std::error::Error;
use std::fmt::{self, Display};
use std::fs::{self, File};
use std::io::{self, ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Key under which the conversation history is stored.
pub const HISTORY_KEY: &str = "chatHistory";

/// An error raised by a [`HistoryStore`].
#[derive(Debug)]
pub struct StoreError {
    key: String,
    source: io::Error,
}

impl StoreError {
    /// Creates a new error for the given key.
    #[inline]
    pub fn new<S: Into<String>>(key: S, source: io::Error) -> Self {
        Self {
            key: key.into(),
            source,
        }
    }

    /// Returns the key that was being accessed.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to access stored `{}`: {}", self.key, self.source)
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// A string key-value store that outlives the session.
///
/// Values are overwritten wholesale; there is no partial update.
pub trait HistoryStore: Send {
    /// Reads the value of `key`, `None` if it was never written or has
    /// been removed.
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes `value` under `key`, replacing any prior value.
    fn save(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// An in-memory store.
///
/// Clones share the same entries, which lets a caller keep a handle to
/// inspect what a session has written.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Returns the raw value of `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Writes a raw value, bypassing any session.
    pub fn insert<K: Into<String>, V: Into<String>>(&self, key: K, value: V) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }
}

impl HistoryStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.get(key))
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.insert(key, value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// A store that keeps each key in its own `<key>.json` file under a
/// directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `dir`. The directory is created lazily on
    /// the first write.
    #[inline]
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the directory holding the files.
    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_of(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl HistoryStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_of(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == IoErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::new(key, err)),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|err| StoreError::new(key, err))?;

        // Write aside, flush to disk and rename, so a crash never leaves
        // half a history.
        let path = self.path_of(key);
        let tmp_path = self.dir.join(format!(".{key}.json.tmp"));
        let to_error = |err| StoreError::new(key, err);
        let mut file = File::create(&tmp_path).map_err(to_error)?;
        file.write_all(value.as_bytes()).map_err(to_error)?;
        file.sync_all().map_err(to_error)?;
        drop(file);
        fs::rename(&tmp_path, &path).map_err(to_error)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_of(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == IoErrorKind::NotFound => Ok(()),
            Err(err) => Err(StoreError::new(key, err)),
        }
    }
}

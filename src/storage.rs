//! Persistent client storage.
//!
//! A small string key/value store that survives restarts, in the spirit of
//! a browser's local storage. Two backends are provided:
//!
//! * [`FileStorage`]: a TOML table on disk, re-read on every access so that
//!   several processes sharing the file see each other's writes
//! * [`MemoryStorage`]: a process-local map, used by tests and for sessions
//!   that should not outlive the process

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::error::{Error, Result};

/// String key/value storage.
///
/// Reads are infallible from the caller's point of view: a storage that
/// cannot be read holds no values. Writes report their failure.
pub trait Storage: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get_item(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removes the value stored under `key`. Removing a missing key is not
    /// an error.
    fn remove_item(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items
            .lock()
            .ok()
            .and_then(|items| items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items.lock()?.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.lock()?.remove(key);
        Ok(())
    }
}

/// Storage backed by a TOML file of string values.
///
/// ```toml
/// jwt_token = "eyJhbGciOi..."
/// ```
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,

    /// Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStorage {
    /// Storage files hold a token or two; refuse anything larger.
    const MAX_FILE_SIZE: u64 = 64 * 1024;

    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        let file_size = match fs::metadata(&self.path) {
            Ok(attributes) => attributes.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        // Prevent out-of-memory condition.
        if file_size > Self::MAX_FILE_SIZE {
            return Err(Error::invalid_argument(format!(
                "{} is too large ({file_size} bytes)",
                self.path.display()
            )));
        }

        let contents = fs::read_to_string(&self.path)?;
        toml::from_str(&contents).map_err(|e| {
            Error::invalid_argument(format!("{} format is invalid: {e}", self.path.display()))
        })
    }

    fn save(&self, items: &BTreeMap<String, String>) -> Result<()> {
        let contents = toml::to_string(items)?;

        // Write next to the target and rename, so that a crash mid-write
        // never leaves a truncated file behind.
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, contents)?;
        fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }

    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self.lock.lock()?;
        let mut items = self.load()?;
        f(&mut items);
        self.save(&items)
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        match self.load() {
            Ok(mut items) => items.remove(key),
            Err(e) => {
                warn!("could not read storage: {e}");
                None
            }
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.update(|items| {
            items.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.update(|items| {
            items.remove(key);
        })
    }
}

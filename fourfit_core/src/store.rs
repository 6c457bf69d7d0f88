//! Local key-value persistence.
//!
//! Every collection lives under a fixed key (`goals`, `workouts`, `bmi`)
//! as a serialized JSON string. The file-backed store writes one file per
//! key with file locking and atomic replacement, so an interrupted write
//! never leaves a half-written collection behind.

use crate::{Error, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Storage key for the goal collection
pub const GOALS_KEY: &str = "goals";
/// Storage key for the workout collection
pub const WORKOUTS_KEY: &str = "workouts";
/// Storage key for the latest BMI record
pub const BMI_KEY: &str = "bmi";
/// Storage key for the placeholder user identifier
pub const USER_ID_KEY: &str = "userId";

/// Minimal string key-value store
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Volatile store, empty on creation
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Directory-backed store: each key maps to `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`; the directory is created lazily on write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(Error::Store(format!("invalid store key {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(&path)?;
        // Acquire shared lock for reading
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        tracing::debug!("Read key {} from {:?}", key, path);
        Ok(Some(contents))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;

        // Temp file in the same directory so the rename stays atomic
        let temp = NamedTempFile::new_in(&self.dir)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            writer.write_all(value.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Wrote key {} to {:?}", key, path);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Read a JSON value stored under `key`
///
/// Missing keys yield `None`. Unparsable content is logged and also
/// treated as missing, so a corrupted entry never blocks the caller.
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };

    match serde_json::from_str::<T>(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!("Failed to parse stored {}: {}. Ignoring it.", key, e);
            Ok(None)
        }
    }
}

/// Serialize `value` and store it under `key`, replacing any prior value
pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let contents = serde_json::to_string(value)?;
    store.set(key, &contents)
}

/// Read the array stored under `key` without decoding its elements
///
/// Missing keys yield an empty array. Content that is not a JSON array is
/// an `Error::Store`, so nothing gets written back over it.
pub fn read_raw_array(store: &dyn KeyValueStore, key: &str) -> Result<Vec<Value>> {
    let Some(raw) = store.get(key)? else {
        return Ok(Vec::new());
    };

    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(_) => Err(Error::Store(format!("stored {} is not an array", key))),
        Err(e) => Err(Error::Store(format!("stored {} is unreadable: {}", key, e))),
    }
}

/// Placeholder user identity: the stored `userId` value, else `fallback`
pub fn current_user_id(store: &dyn KeyValueStore, fallback: &str) -> String {
    match store.get(USER_ID_KEY) {
        Ok(Some(id)) if !id.trim().is_empty() => id.trim().trim_matches('"').to_string(),
        Ok(_) => fallback.to_string(),
        Err(e) => {
            tracing::warn!("Unable to read stored user id: {}", e);
            fallback.to_string()
        }
    }
}

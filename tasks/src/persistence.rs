//! Persistence of the task lists to key-value storage.
//!
//! # Format
//!
//! Each list is stored under its own key ([`PENDING_KEY`], [`FINISHED_KEY`])
//! as a JSON array of display strings, in list order:
//!
//! ```json
//! ["buy milk", "call mom — due friday"]
//! ```
//!
//! A task renders as `"<text>"`, or `"<text> — due <due>"` when it has a due
//! date. Reading splits on the first [`DUE_SEPARATOR`]: the part before it is
//! the text, the part after it is the due date.
//!
//! # Known Limitation
//!
//! Task text that itself contains [`DUE_SEPARATOR`] does not survive a round
//! trip: everything after the first separator is read back as the due date.
//! The format carries no escaping.
//!
//! # Recovery
//!
//! [`load`] never fails. A missing key, unreadable storage or malformed
//! content yields an empty list and a warning in the log.
//!
//! # Example
//!
//! ```
//! use yunie_tasks::persistence::{decode_entry, encode_entry, TaskRecord};
//!
//! let line = encode_entry("call mom", Some("friday"));
//! assert_eq!(line, "call mom — due friday");
//!
//! let record = decode_entry(&line);
//! assert_eq!(record, TaskRecord::new("call mom", Some("friday")));
//! ```

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::{debug, warn};

use crate::types::Task;

/// Storage key of the pending list.
pub const PENDING_KEY: &str = "todos";

/// Storage key of the finished list.
pub const FINISHED_KEY: &str = "finished";

/// Separator between task text and due date in a stored entry.
pub const DUE_SEPARATOR: &str = " — due ";

/// File extension used by [`FileStore`].
const FILE_EXTENSION: &str = "json";

/// Errors raised by storage backends.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),

    /// A list could not be encoded or decoded.
    #[error("storage encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// The key cannot be used as a storage location.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// String key-value storage, in the manner of browser local storage.
pub trait KeyValueStore: Send {
    /// Returns the value stored under `key`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory store.
///
/// Clones share the same underlying map, so a test can keep a handle to a
/// store it has handed to a board.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw value under `key`.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.raw(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Directory-backed store: each key lives in `<dir>/<key>.json`.
///
/// Writes go to a temporary sibling file which is then renamed over the
/// target, so a crash mid-write leaves the previous value intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory holding the key files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.{FILE_EXTENSION}")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        let tmp_path = path.with_extension(format!("{FILE_EXTENSION}.tmp"));
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;

        debug!(path = %path.display(), bytes = value.len(), "Wrote storage key");
        Ok(())
    }
}

/// A task as read back from storage: text and optional due date, no id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub text: String,
    pub due: Option<String>,
}

impl TaskRecord {
    #[must_use]
    pub fn new(text: impl Into<String>, due: Option<&str>) -> Self {
        Self {
            text: text.into(),
            due: due.map(str::to_string),
        }
    }
}

/// Renders one stored entry.
#[must_use]
pub fn encode_entry(text: &str, due: Option<&str>) -> String {
    match due.map(str::trim).filter(|d| !d.is_empty()) {
        Some(due) => format!("{text}{DUE_SEPARATOR}{due}"),
        None => text.to_string(),
    }
}

/// Parses one stored entry, splitting on the first [`DUE_SEPARATOR`].
#[must_use]
pub fn decode_entry(entry: &str) -> TaskRecord {
    match entry.split_once(DUE_SEPARATOR) {
        Some((text, due)) => {
            let due = due.trim();
            TaskRecord {
                text: text.trim().to_string(),
                due: (!due.is_empty()).then(|| due.to_string()),
            }
        }
        None => TaskRecord {
            text: entry.trim().to_string(),
            due: None,
        },
    }
}

fn encode_list(tasks: &[Task]) -> Result<String, StorageError> {
    let entries: Vec<String> = tasks
        .iter()
        .map(|task| encode_entry(task.text(), task.due()))
        .collect();
    Ok(serde_json::to_string(&entries)?)
}

/// Writes both lists to `store`, finished list first.
///
/// A task moving from pending to finished is therefore never absent from
/// both stored lists: if the second write fails it is stored twice, and
/// [`TodoBoard::restore`](crate::board::TodoBoard::restore) keeps the first
/// copy.
///
/// # Errors
///
/// Returns `StorageError` if either key cannot be written.
pub fn save(
    store: &mut dyn KeyValueStore,
    pending: &[Task],
    finished: &[Task],
) -> Result<(), StorageError> {
    store.set(FINISHED_KEY, &encode_list(finished)?)?;
    store.set(PENDING_KEY, &encode_list(pending)?)?;
    debug!(
        pending = pending.len(),
        finished = finished.len(),
        "Saved task lists"
    );
    Ok(())
}

/// Reads both lists from `store`, returning `(pending, finished)`.
///
/// Never fails; see the module docs for recovery behavior.
#[must_use]
pub fn load(store: &dyn KeyValueStore) -> (Vec<TaskRecord>, Vec<TaskRecord>) {
    (load_list(store, PENDING_KEY), load_list(store, FINISHED_KEY))
}

fn load_list(store: &dyn KeyValueStore, key: &str) -> Vec<TaskRecord> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!(key = key, "No stored list, starting empty");
            return Vec::new();
        }
        Err(err) => {
            warn!(key = key, error = %err, "Failed to read stored list, starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(entries) => entries.iter().map(|entry| decode_entry(entry)).collect(),
        Err(err) => {
            warn!(key = key, error = %err, "Stored list is malformed, starting empty");
            Vec::new()
        }
    }
}

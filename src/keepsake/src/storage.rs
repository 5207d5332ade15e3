//! Local key-value persistence with JSON values.
//!
//! [`Backend`] is the raw string store (in-memory, a JSON file, or browser
//! `localStorage` under the `wasm` feature). [`Store`] layers typed JSON
//! access on top and swallows every failure: reads fall back to the caller's
//! default, writes that fail are logged and dropped.

use crate::history::QuizRecord;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

pub const QUIZ_DATA_KEY: &str = "quizData";
pub const LETTER_UNLOCKED_KEY: &str = "letterUnlocked";
pub const PREFERENCES_KEY: &str = "preferences";

/// Prefix of the sentinel keys written by [`Store::run_once`]
const EXECUTED_PREFIX: &str = "executed_";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Raw string key-value storage
pub trait Backend {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
    fn keys(&self) -> Result<Vec<String>, StorageError>;
    fn clear(&mut self) -> Result<(), StorageError>;
}

/// Process-local storage, lost on exit
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    items: BTreeMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for MemoryBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.items.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.items.keys().cloned().collect())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.items.clear();
        Ok(())
    }
}

/// All keys in one JSON object file.
///
/// The file is read once on open; every write rewrites it through a temporary
/// file and a rename so a crash never leaves a half-written store.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    items: BTreeMap<String, String>,
}

impl FileBackend {
    /// Open (or lazily create) the store at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let items = if path.exists() {
            let data = fs::read_to_string(&path)?;
            if data.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&data)?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, items })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "store.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn flush(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.items)?;
        let tmp = self.tmp_path();
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Apply a change to the cache and persist it, rolling the cache back if
    /// the write fails
    fn commit(
        &mut self,
        change: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), StorageError> {
        let previous = self.items.clone();
        change(&mut self.items);
        if let Err(e) = self.flush() {
            self.items = previous;
            return Err(e);
        }
        Ok(())
    }
}

impl Backend for FileBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.commit(|items| {
            items.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.commit(|items| {
            items.remove(key);
        })
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.items.keys().cloned().collect())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.commit(BTreeMap::clear)
    }
}

/// User-facing preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(rename = "musicEnabled", default)]
    pub music_enabled: bool,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(rename = "recipientName", default = "default_recipient_name")]
    pub recipient_name: String,
}

fn default_theme() -> String {
    "light".to_string()
}

fn default_recipient_name() -> String {
    "Laura".to_string()
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            music_enabled: false,
            theme: default_theme(),
            recipient_name: default_recipient_name(),
        }
    }
}

/// Typed JSON view over a [`Backend`]. Never surfaces an error.
#[derive(Debug, Default)]
pub struct Store<B: Backend> {
    backend: B,
}

impl Store<MemoryBackend> {
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }
}

impl Store<FileBackend> {
    /// Open a file-backed store. An unreadable file is logged and replaced
    /// by an empty store that will overwrite it on the next write.
    pub fn open_file<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let backend = FileBackend::open(path).unwrap_or_else(|e| {
            warn!(
                "Failed to read store at {}, starting empty: {}",
                path.display(),
                e
            );
            FileBackend {
                path: path.to_path_buf(),
                items: BTreeMap::new(),
            }
        });
        Self::new(backend)
    }
}

impl<B: Backend> Store<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Read and decode `key`, or `default` when missing or unreadable
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.backend.get_item(key) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Failed to decode {}: {}", key, e);
                default
            }),
            Ok(None) => default,
            Err(e) => {
                warn!("Failed to read {}: {}", key, e);
                default
            }
        }
    }

    /// Encode and write `value`. Failures are logged and dropped.
    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to encode {}: {}", key, e);
                return;
            }
        };
        if let Err(e) = self.backend.set_item(key, &raw) {
            warn!("Failed to write {}: {}", key, e);
        }
    }

    pub fn has(&self, key: &str) -> bool {
        matches!(self.backend.get_item(key), Ok(Some(_)))
    }

    pub fn remove(&mut self, key: &str) {
        if let Err(e) = self.backend.remove_item(key) {
            warn!("Failed to remove {}: {}", key, e);
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.backend.keys().unwrap_or_else(|e| {
            warn!("Failed to list keys: {}", e);
            Vec::new()
        })
    }

    pub fn clear(&mut self) {
        if let Err(e) = self.backend.clear() {
            warn!("Failed to clear store: {}", e);
        }
    }

    /// Run `f` at most once per key for the lifetime of the store.
    /// Returns whether `f` ran.
    pub fn run_once<F: FnOnce()>(&mut self, key: &str, f: F) -> bool {
        let sentinel = format!("{}{}", EXECUTED_PREFIX, key);
        if self.has(&sentinel) {
            return false;
        }
        f();
        self.set(&sentinel, &true);
        true
    }

    /// Read-modify-write of one key as a single step. Returns the value that
    /// was written.
    pub fn update<T, F>(&mut self, key: &str, default: T, f: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T),
    {
        let mut value = self.get(key, default);
        f(&mut value);
        self.set(key, &value);
        value
    }

    pub fn quiz_data(&self) -> QuizRecord {
        self.get(QUIZ_DATA_KEY, QuizRecord::default())
    }

    pub fn save_quiz_data(&mut self, data: &QuizRecord) {
        self.set(QUIZ_DATA_KEY, data);
    }

    pub fn is_letter_unlocked(&self) -> bool {
        self.get(LETTER_UNLOCKED_KEY, false)
    }

    pub fn unlock_letter(&mut self) {
        self.set(LETTER_UNLOCKED_KEY, &true);
    }

    pub fn preferences(&self) -> Preferences {
        self.get(PREFERENCES_KEY, Preferences::default())
    }

    pub fn save_preferences(&mut self, preferences: &Preferences) {
        self.set(PREFERENCES_KEY, preferences);
    }
}

//! The store module holds the key-value persistence capability the engine reads its high score
//! from and writes it back to.
//!
//! The engine only ever sees the `KeyValueStore` trait, so the terminal game hands it a
//! `FileStore` backed by a small TOML file while tests hand it a `MemoryStore`.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// The key under which the best score ever observed is stored.
pub const HIGH_SCORE_KEY: &str = "unicornHighScore";

/// This enum holds the ways writing to a store may fail. Reading never fails: an entry that cannot
/// be read is simply absent.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The entries could not be serialized into the on-disk format.
    #[error("could not encode the store entries: {0}")]
    Encode(#[from] toml::ser::Error),
    /// The backing file could not be written.
    #[error("could not write the store file: {0}")]
    Io(#[from] io::Error),
}

/// A string-to-string key-value store.
pub trait KeyValueStore {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` when the value could not be made durable. The in-memory view of the
    /// store is updated regardless.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// This struct is the on-disk shape of a store: a single flat TOML table of strings.
#[derive(Default, Deserialize, Serialize)]
#[serde(transparent)]
struct Entries(BTreeMap<String, String>);

/// An in-memory store that forgets everything once dropped.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    /// This field contains every entry set so far.
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding the given entry, which is handy to simulate what a previous
    /// session left behind.
    #[must_use]
    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        let _ = store.entries.insert(key.to_owned(), value.to_owned());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let _ = self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// A store persisted as a TOML file. The whole file is read once on open and rewritten on every
/// `set`.
#[derive(Debug)]
pub struct FileStore {
    /// This field contains the entries as last read or written.
    entries: BTreeMap<String, String>,
    /// This field contains the location of the backing file.
    path: PathBuf,
}

impl FileStore {
    /// Opens the store at `path`.
    ///
    /// A missing file yields an empty store. A file that cannot be read or parsed is logged and
    /// also treated as empty; it will be overwritten by the next `set`.
    #[must_use]
    pub fn open<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Entries>(&contents) {
                Ok(Entries(entries)) => entries,
                Err(err) => {
                    warn!("ignoring unparseable store {}: {err}", path.display());
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("no store at {}, starting empty", path.display());
                BTreeMap::new()
            }
            Err(err) => {
                warn!("ignoring unreadable store {}: {err}", path.display());
                BTreeMap::new()
            }
        };

        Self { entries, path }
    }

    /// Returns the location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// This function writes every entry back to the backing file, creating its parent directory if
    /// needed.
    fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let contents = toml::to_string(&Entries(self.entries.clone()))?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let _ = self.entries.insert(key.to_owned(), value.to_owned());
        self.flush()
    }
}

/// Reads the high score out of `store`. Anything that is not a base-10 non-negative integer counts
/// as no high score at all.
pub fn load_high_score<S: KeyValueStore>(store: &S) -> u32 {
    store
        .get(HIGH_SCORE_KEY)
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(0)
}

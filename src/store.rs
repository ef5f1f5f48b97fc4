use directories::ProjectDirs;
use log::warn;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::sequence::{SequenceDefinition, TimerSpec};

/// Key under which every named sequence is kept
pub const STORAGE_KEY: &str = "sequenceStorage";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("could not encode sequences: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stored sequences are corrupt, refusing to overwrite them: {0}")]
    Corrupt(serde_json::Error),
}

/// String key-value storage, the shape of a browser's local storage
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// One file per key inside a data directory
#[derive(Debug, Clone)]
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let dir = if let Some(pd) = ProjectDirs::from("", "", "tsq") {
            pd.data_dir().to_path_buf()
        } else {
            PathBuf::from(".tsq")
        };
        Self { dir }
    }

    pub fn with_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Default for FileKvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// In-memory store for tests and throwaway sessions
#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    entries: HashMap<String, String>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// Older saves kept only the timer list; those load with a single execution.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredSequence {
    Full(SequenceDefinition),
    TimersOnly(Vec<TimerSpec>),
}

impl From<StoredSequence> for SequenceDefinition {
    fn from(stored: StoredSequence) -> Self {
        match stored {
            StoredSequence::Full(def) => def,
            StoredSequence::TimersOnly(timers) => SequenceDefinition::new(timers, 1),
        }
    }
}

/// Named sequences kept as one JSON object under [`STORAGE_KEY`]
#[derive(Debug, Clone)]
pub struct SequenceStore<S: KeyValueStore> {
    backend: S,
}

impl<S: KeyValueStore> SequenceStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    /// Every stored sequence, ordered by name.
    ///
    /// Missing or unreadable storage yields an empty map. Entries that fail to decode are
    /// skipped.
    pub fn sequences(&self) -> BTreeMap<String, SequenceDefinition> {
        let raw = match self.raw_entries() {
            Ok(raw) => raw,
            Err(e) => {
                warn!("could not read {STORAGE_KEY}: {e}");
                return BTreeMap::new();
            }
        };

        raw.into_iter()
            .filter_map(
                |(name, value)| match serde_json::from_value::<StoredSequence>(value) {
                    Ok(stored) => Some((name, stored.into())),
                    Err(e) => {
                        warn!("skipping stored sequence '{name}': {e}");
                        None
                    }
                },
            )
            .collect()
    }

    /// The storage object with every entry left undecoded, so writes carry entries this
    /// build cannot read back unchanged
    fn raw_entries(&self) -> Result<BTreeMap<String, serde_json::Value>, StoreError> {
        match self.backend.get(STORAGE_KEY)? {
            Some(text) => serde_json::from_str(&text).map_err(StoreError::Corrupt),
            None => Ok(BTreeMap::new()),
        }
    }

    pub fn sequence(&self, name: &str) -> Option<SequenceDefinition> {
        let found = self.sequences().remove(name);
        if found.is_none() {
            warn!("no stored sequence named '{name}'");
        }
        found
    }

    /// Add or replace a named sequence. Fails without writing when the stored data cannot
    /// be read.
    pub fn store_sequence(
        &mut self,
        name: &str,
        definition: &SequenceDefinition,
    ) -> Result<(), StoreError> {
        let mut all = self.raw_entries()?;
        all.insert(name.to_string(), serde_json::to_value(definition)?);
        self.write(&all)
    }

    /// Returns whether the sequence existed
    pub fn remove_sequence(&mut self, name: &str) -> Result<bool, StoreError> {
        let mut all = self.raw_entries()?;
        let existed = all.remove(name).is_some();
        if existed {
            if all.is_empty() {
                self.backend.remove(STORAGE_KEY)?;
            } else {
                self.write(&all)?;
            }
        }
        Ok(existed)
    }

    fn write(&mut self, all: &BTreeMap<String, serde_json::Value>) -> Result<(), StoreError> {
        let text = serde_json::to_string(all)?;
        self.backend.set(STORAGE_KEY, &text)
    }
}

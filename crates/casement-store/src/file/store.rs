use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use casement_common::StoreError;
use notify::RecommendedWatcher;
use tempfile::NamedTempFile;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::keys::{is_valid_key, validate_key};
use super::watcher::{read_value, watch_dir, KnownValues};
use crate::event::Envelope;
use crate::subscription::Subscription;
use crate::{SharedStore, DEFAULT_CHANNEL_CAPACITY};

/// A shared store backed by a directory, one file per key.
///
/// Every process that opens the same directory shares the store. A handle
/// is notified of writes made through any other handle, in this process or
/// another one.
pub struct FileStore {
    dir: PathBuf,
    known: KnownValues,
    tx: broadcast::Sender<Envelope>,
    _watcher: RecommendedWatcher,
}

impl FileStore {
    /// Open (creating if needed) the store directory with default capacity.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open_with_capacity(dir, DEFAULT_CHANNEL_CAPACITY)
    }

    /// Open the store directory, buffering up to `capacity` notifications
    /// per subscriber.
    pub fn open_with_capacity(dir: impl Into<PathBuf>, capacity: usize) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let known: KnownValues = Arc::new(Mutex::new(Self::snapshot(&dir)?));
        let (tx, _) = broadcast::channel(capacity.max(1));
        let watcher = watch_dir(dir.clone(), Arc::clone(&known), tx.clone())?;

        info!("opened file store at {}", dir.display());
        Ok(Self {
            dir,
            known,
            tx,
            _watcher: watcher,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Current contents of every key file in the directory.
    fn snapshot(dir: &Path) -> Result<HashMap<String, String>, StoreError> {
        let mut values = HashMap::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(key) = name.to_str() else {
                continue;
            };
            if !is_valid_key(key) || !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(value) = read_value(&entry.path())? {
                values.insert(key.to_string(), value);
            }
        }
        Ok(values)
    }
}

impl SharedStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        Ok(read_value(&self.dir.join(key))?)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        let mut known = self.known.lock().map_err(|_| StoreError::Poisoned)?;

        // Uniquely named per write, then renamed over the key file.
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.persist(self.dir.join(key)).map_err(|e| e.error)?;

        known.insert(key.to_string(), value.to_string());
        debug!(key, bytes = value.len(), "file store write");
        Ok(())
    }

    fn subscribe(&self) -> Subscription {
        Subscription::new(self.tx.subscribe(), None)
    }
}

//! Directory watcher that turns file changes into store notifications.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use casement_common::StoreError;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::broadcast;
use tracing::{debug, error, warn};

use super::keys::is_valid_key;
use crate::event::{Envelope, StorageEvent};

/// Last value this handle knows for each key. Shared between writes and the
/// watcher so a handle's own writes are not reported back to it.
pub(super) type KnownValues = Arc<Mutex<HashMap<String, String>>>;

/// Read a key file; a missing file is an absent value.
pub(super) fn read_value(path: &Path) -> io::Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Compare the file for `key` against the known value and publish a
/// notification if it differs.
fn reconcile(dir: &Path, key: &str, known: &KnownValues, tx: &broadcast::Sender<Envelope>) {
    let Ok(mut values) = known.lock() else {
        error!(key, "known-value lock poisoned, dropping file change");
        return;
    };

    // Read under the lock so a concurrent own write cannot slip in between.
    let new_value = match read_value(&dir.join(key)) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, "failed to read changed key file: {e}");
            return;
        }
    };

    let old_value = values.get(key).cloned();
    if old_value == new_value {
        return;
    }

    match &new_value {
        Some(value) => values.insert(key.to_string(), value.clone()),
        None => values.remove(key),
    };

    debug!(key, "external store change detected");
    let _ = tx.send(Envelope {
        origin: None,
        event: StorageEvent::new(key, old_value, new_value),
    });
}

/// Start watching `dir`. The returned watcher must be kept alive.
pub(super) fn watch_dir(
    dir: PathBuf,
    known: KnownValues,
    tx: broadcast::Sender<Envelope>,
) -> Result<RecommendedWatcher, StoreError> {
    let watch_path = dir.clone();

    let mut watcher = RecommendedWatcher::new(
        move |result: Result<Event, notify::Error>| match result {
            Ok(event) => {
                let relevant = matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                );
                if !relevant {
                    return;
                }

                for path in &event.paths {
                    let Some(key) = path.file_name().and_then(|n| n.to_str()) else {
                        continue;
                    };
                    if is_valid_key(key) {
                        reconcile(&dir, key, &known, &tx);
                    }
                }
            }
            Err(e) => {
                error!("store watcher error: {e}");
            }
        },
        notify::Config::default(),
    )
    .map_err(|e| StoreError::Watch(format!("failed to create watcher: {e}")))?;

    watcher
        .watch(&watch_path, RecursiveMode::NonRecursive)
        .map_err(|e| {
            StoreError::Watch(format!("failed to watch {}: {e}", watch_path.display()))
        })?;

    Ok(watcher)
}

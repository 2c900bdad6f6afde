//! In-process shared store.
//!
//! Every [`MemoryStore`] handle opened from the same root shares one map and
//! one notification channel, and acts as a separate context: a write through
//! one handle is delivered to the subscriptions of all the others.


use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use casement_common::StoreError;
use tokio::sync::broadcast;
use tracing::debug;

use crate::event::{Envelope, StorageEvent};
use crate::subscription::Subscription;
use crate::{SharedStore, DEFAULT_CHANNEL_CAPACITY};

struct Shared {
    values: Mutex<HashMap<String, String>>,
    tx: broadcast::Sender<Envelope>,
    next_origin: AtomicU64,
    writes: AtomicU64,
}

pub struct MemoryStore {
    shared: Arc<Shared>,
    origin: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a store whose subscribers buffer up to `capacity` notifications.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        let shared = Arc::new(Shared {
            values: Mutex::new(HashMap::new()),
            tx,
            next_origin: AtomicU64::new(1),
            writes: AtomicU64::new(0),
        });
        Self { shared, origin: 0 }
    }

    /// Open another handle on the same store, acting as a separate context.
    pub fn open_handle(&self) -> Self {
        let origin = self.shared.next_origin.fetch_add(1, Ordering::Relaxed);
        Self {
            shared: Arc::clone(&self.shared),
            origin,
        }
    }

    /// Total `set` calls across every handle of this store.
    pub fn write_count(&self) -> u64 {
        self.shared.writes.load(Ordering::Relaxed)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.shared.values.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.shared.values.lock().map_err(|_| StoreError::Poisoned)?;
        self.shared.writes.fetch_add(1, Ordering::Relaxed);

        let old_value = values.insert(key.to_string(), value.to_string());
        if old_value.as_deref() == Some(value) {
            return Ok(());
        }

        // Sent under the lock so notification order matches write order.
        let receivers = self
            .shared
            .tx
            .send(Envelope {
                origin: Some(self.origin),
                event: StorageEvent::new(key, old_value, Some(value.to_string())),
            })
            .unwrap_or(0);
        debug!(key, origin = self.origin, receivers, "memory store write");
        Ok(())
    }

    fn subscribe(&self) -> Subscription {
        Subscription::new(self.shared.tx.subscribe(), Some(self.origin))
    }
}

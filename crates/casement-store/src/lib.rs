//! Shared key/value stores with cross-context change notifications.
//!
//! A [`SharedStore`] is the only channel registry contexts use to talk to
//! each other. Every handle can read and write any key; writes made through
//! one handle surface as [`StorageEvent`]s on the subscriptions of every
//! *other* handle, never on the writer's own.
//!
//! Two implementations ship here:
//!
//! - [`MemoryStore`]: in-process, deterministic, used by tests and demos.
//! - [`FileStore`]: one file per key in a directory, watched with `notify`,
//!   shared between processes.

mod event;
pub mod file;
pub mod memory;
mod subscription;

pub use event::StorageEvent;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use subscription::{Subscription, SubscriptionError};

use std::sync::Arc;

use casement_common::StoreError;

/// Notifications buffered per subscriber before it starts lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// A key/value store visible to every context, with change notifications.
pub trait SharedStore {
    /// Current value for `key`, or `None` if it was never written.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`. Other handles are notified if the value changed.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Subscribe to writes made by other handles.
    fn subscribe(&self) -> Subscription;
}

impl<T: SharedStore + ?Sized> SharedStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn subscribe(&self) -> Subscription {
        (**self).subscribe()
    }
}

impl<T: SharedStore + ?Sized> SharedStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn subscribe(&self) -> Subscription {
        (**self).subscribe()
    }
}

//! Registration and deregistration.

use casement_common::{RegistrationState, RegistryError, WindowEntry, WindowId};
use casement_store::SharedStore;
use tracing::{debug, info};

use super::WindowRegistry;
use crate::shape::ShapeSource;
use crate::COUNT_KEY;

impl<S: SharedStore, G: ShapeSource> WindowRegistry<S, G> {
    /// Join the shared registry with `meta_data` attached to this context's
    /// entry.
    ///
    /// Takes the next value of the shared counter as this context's id,
    /// appends the entry to the list, then writes `count` and `windows` as
    /// two separate writes. A peer reading between them sees the counter
    /// bumped before the entry appears.
    pub fn register(&mut self, meta_data: serde_json::Value) -> Result<WindowEntry, RegistryError> {
        if self.state != RegistrationState::Unregistered {
            return Err(RegistryError::AlreadyRegistered);
        }
        let shape = self.current_shape()?;

        let mut windows = self.read_windows()?;
        let count = self.read_count()? + 1;
        let id = WindowId(count);

        let entry = WindowEntry::new(id, shape, meta_data);
        windows.push(entry.clone());

        self.store.set(COUNT_KEY, &count.to_string())?;
        self.persist_windows(&windows)?;

        self.windows = windows;
        self.own = Some(entry.clone());
        self.state = RegistrationState::Registered;

        info!(
            context = self.context.short(),
            window = %id,
            shape = %entry.shape,
            peers = self.windows.len() - 1,
            "registered"
        );
        Ok(entry)
    }

    /// Leave the shared registry, typically right before the context exits.
    ///
    /// Removes this context's entry from the list and persists it; `count`
    /// is left alone. Returns `false` if the entry was already gone, in
    /// which case nothing is written. If the write fails the registry stays
    /// registered and the call can be retried.
    pub fn deregister(&mut self) -> Result<bool, RegistryError> {
        let id = self.require_registered()?;

        let Some(index) = self.window_index(id) else {
            debug!(
                context = self.context.short(),
                window = %id,
                "entry already removed from window list"
            );
            self.state = RegistrationState::Deregistered;
            return Ok(false);
        };

        let mut windows = self.windows.clone();
        windows.remove(index);
        self.persist_windows(&windows)?;

        self.windows = windows;
        self.state = RegistrationState::Deregistered;

        info!(
            context = self.context.short(),
            window = %id,
            remaining = self.windows.len(),
            "deregistered"
        );
        Ok(true)
    }
}

//! Local shape polling.

use casement_common::RegistryError;
use casement_store::SharedStore;
use tracing::{debug, warn};

use super::WindowRegistry;
use crate::shape::ShapeSource;

impl<S: SharedStore, G: ShapeSource> WindowRegistry<S, G> {
    /// Check whether this context moved or resized since the last poll.
    ///
    /// Meant to be called once per frame. When the shape changed, the own
    /// entry and its copy in the list are updated, the shape-changed
    /// callback runs, and then the list is written back. Returns whether
    /// anything changed; an unchanged shape writes nothing. A non-finite
    /// shape is refused with [`RegistryError::InvalidShape`] and nothing
    /// is written.
    pub fn poll_shape_change(&mut self) -> Result<bool, RegistryError> {
        let id = self.require_registered()?;
        let shape = self.current_shape()?;

        let own = self.own.as_ref().ok_or(RegistryError::NotRegistered)?;
        if own.shape == shape {
            return Ok(false);
        }
        let mut updated = own.clone();
        updated.shape = shape;

        let mut windows = self.windows.clone();
        match windows.iter_mut().find(|w| w.id == id) {
            Some(entry) => entry.shape = shape,
            None => {
                // A peer wrote a list that no longer has us.
                warn!(
                    context = self.context.short(),
                    window = %id,
                    "own entry missing from window list, re-adding"
                );
                windows.push(updated.clone());
            }
        }

        if let Some(callback) = self.on_shape_changed.as_mut() {
            callback(&updated);
        }

        debug!(context = self.context.short(), window = %id, %shape, "shape changed");
        self.persist_windows(&windows)?;

        // A failed write leaves the previous shape in place for the next poll.
        self.windows = windows;
        self.own = Some(updated);
        Ok(true)
    }
}

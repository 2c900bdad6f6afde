//! Reacting to window-list writes from other contexts.

use casement_common::{RegistryError, WindowEntry};
use casement_store::{SharedStore, StorageEvent, SubscriptionError};
use tracing::{debug, warn};

use super::types::parse_windows;
use super::WindowRegistry;
use crate::shape::ShapeSource;
use crate::WINDOWS_KEY;

/// Whether two window lists differ in membership or order.
///
/// Compares lengths, then ids position by position. Shapes and metadata
/// are ignored, so a peer moving does not count as a change, but the same
/// ids in a different order does.
pub fn did_windows_change(previous: &[WindowEntry], next: &[WindowEntry]) -> bool {
    if previous.len() != next.len() {
        return true;
    }
    previous.iter().zip(next).any(|(p, n)| p.id != n.id)
}

impl<S: SharedStore, G: ShapeSource> WindowRegistry<S, G> {
    /// Take in a new raw `windows` value written by another context.
    ///
    /// The mirror is always replaced. The peer-list callback runs only when
    /// [`did_windows_change`] reports a difference. Returns whether it did.
    pub fn handle_external_change(&mut self, raw_new_value: Option<&str>) -> bool {
        let next = parse_windows(raw_new_value);
        let changed = did_windows_change(&self.windows, &next);
        self.windows = next;

        if changed {
            debug!(
                context = self.context.short(),
                windows = self.windows.len(),
                "peer list changed"
            );
            if let Some(callback) = self.on_peer_list_changed.as_mut() {
                callback(&self.windows);
            }
        }
        changed
    }

    /// Dispatch one store notification. Only `windows` writes are handled.
    pub fn handle_storage_event(&mut self, event: &StorageEvent) -> bool {
        if !event.is_for(WINDOWS_KEY) {
            return false;
        }
        self.handle_external_change(event.new_value.as_deref())
    }

    /// Handle every notification waiting on this registry's subscription
    /// without blocking. Returns how many were processed.
    ///
    /// If the subscription fell behind, the stale backlog is dropped and the
    /// current `windows` value is read from the store instead.
    pub fn pump_events(&mut self) -> Result<usize, RegistryError> {
        let mut processed = 0;
        loop {
            match self.subscription.try_next() {
                Ok(Some(event)) => {
                    self.handle_storage_event(&event);
                    processed += 1;
                }
                Ok(None) | Err(SubscriptionError::Closed) => break,
                Err(SubscriptionError::Lagged(n)) => {
                    warn!(
                        context = self.context.short(),
                        "missed {n} store notifications, resyncing window list"
                    );
                    self.discard_backlog();
                    let raw = self.store.get(WINDOWS_KEY)?;
                    self.handle_external_change(raw.as_deref());
                    processed += 1;
                }
            }
        }
        Ok(processed)
    }

    fn discard_backlog(&mut self) {
        while let Ok(Some(_)) | Err(SubscriptionError::Lagged(_)) = self.subscription.try_next() {}
    }
}

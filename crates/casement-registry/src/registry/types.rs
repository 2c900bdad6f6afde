//! Core types, constructor, and accessors for WindowRegistry.

use casement_common::{ContextId, RegistrationState, RegistryError, Shape, WindowEntry, WindowId};
use casement_store::{SharedStore, Subscription};
use tracing::{debug, warn};

use crate::shape::ShapeSource;
use crate::{COUNT_KEY, WINDOWS_KEY};

/// Invoked with this context's entry after its shape changed.
pub type ShapeChangedCallback = Box<dyn FnMut(&WindowEntry)>;

/// Invoked with the new window list after peers joined, left, or reordered.
pub type PeerListChangedCallback = Box<dyn FnMut(&[WindowEntry])>;

/// One context's view of the shared window list.
///
/// Owns the store handle, the geometry source, and a subscription opened at
/// construction so no peer change is missed between `new` and `register`.
pub struct WindowRegistry<S, G> {
    pub(super) store: S,
    pub(super) shapes: G,
    pub(super) subscription: Subscription,
    pub(super) context: ContextId,
    pub(super) state: RegistrationState,
    /// Last observed value of the shared list.
    pub(super) windows: Vec<WindowEntry>,
    pub(super) own: Option<WindowEntry>,
    pub(super) on_shape_changed: Option<ShapeChangedCallback>,
    pub(super) on_peer_list_changed: Option<PeerListChangedCallback>,
}

impl<S: SharedStore, G: ShapeSource> WindowRegistry<S, G> {
    pub fn new(store: S, shapes: G) -> Self {
        let subscription = store.subscribe();
        let context = ContextId::new();
        debug!(context = context.short(), "window registry created");

        Self {
            store,
            shapes,
            subscription,
            context,
            state: RegistrationState::Unregistered,
            windows: Vec::new(),
            own: None,
            on_shape_changed: None,
            on_peer_list_changed: None,
        }
    }

    // -- Accessors --

    /// The current mirror of the shared window list.
    pub fn windows(&self) -> &[WindowEntry] {
        &self.windows
    }

    /// This context's entry, once registered. Kept after deregistration.
    pub fn own_entry(&self) -> Option<&WindowEntry> {
        self.own.as_ref()
    }

    pub fn own_id(&self) -> Option<WindowId> {
        self.own.as_ref().map(|e| e.id)
    }

    pub fn context_id(&self) -> &ContextId {
        &self.context
    }

    pub fn state(&self) -> RegistrationState {
        self.state
    }

    /// Position of the entry with `id` in the mirror.
    pub fn window_index(&self, id: WindowId) -> Option<usize> {
        self.windows.iter().position(|w| w.id == id)
    }

    // -- Callbacks --

    /// Replace the own-shape-changed callback.
    pub fn set_shape_changed_callback(&mut self, callback: impl FnMut(&WindowEntry) + 'static) {
        self.on_shape_changed = Some(Box::new(callback));
    }

    pub fn clear_shape_changed_callback(&mut self) {
        self.on_shape_changed = None;
    }

    /// Replace the peer-list-changed callback.
    pub fn set_peer_list_changed_callback(
        &mut self,
        callback: impl FnMut(&[WindowEntry]) + 'static,
    ) {
        self.on_peer_list_changed = Some(Box::new(callback));
    }

    pub fn clear_peer_list_changed_callback(&mut self) {
        self.on_peer_list_changed = None;
    }

    // -- Store helpers --

    /// The id this context was registered under, or why it has none.
    pub(super) fn require_registered(&self) -> Result<WindowId, RegistryError> {
        match self.state {
            RegistrationState::Unregistered => Err(RegistryError::NotRegistered),
            RegistrationState::Deregistered => Err(RegistryError::Deregistered),
            RegistrationState::Registered => self.own_id().ok_or(RegistryError::NotRegistered),
        }
    }

    pub(super) fn read_windows(&self) -> Result<Vec<WindowEntry>, RegistryError> {
        let raw = self.store.get(WINDOWS_KEY)?;
        Ok(parse_windows(raw.as_deref()))
    }

    pub(super) fn read_count(&self) -> Result<u64, RegistryError> {
        let raw = self.store.get(COUNT_KEY)?;
        Ok(parse_count(raw.as_deref()))
    }

    /// Write `windows` to the store. The mirror is left untouched so the
    /// caller can commit it only once the write went through.
    pub(super) fn persist_windows(&self, windows: &[WindowEntry]) -> Result<(), RegistryError> {
        let json = serde_json::to_string(windows)?;
        self.store.set(WINDOWS_KEY, &json)?;
        debug!(
            context = self.context.short(),
            windows = windows.len(),
            "persisted window list"
        );
        Ok(())
    }

    /// The current shape from the source, refusing values JSON cannot hold.
    pub(super) fn current_shape(&self) -> Result<Shape, RegistryError> {
        let shape = self.shapes.current_shape();
        if shape.is_finite() {
            Ok(shape)
        } else {
            Err(RegistryError::InvalidShape(shape))
        }
    }
}

/// Decode a stored window list. Absent, `null`, and corrupt values all read
/// as an empty list.
pub(super) fn parse_windows(raw: Option<&str>) -> Vec<WindowEntry> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    match serde_json::from_str::<Option<Vec<WindowEntry>>>(raw) {
        Ok(windows) => windows.unwrap_or_default(),
        Err(e) => {
            warn!("ignoring unparsable {WINDOWS_KEY} value: {e}");
            Vec::new()
        }
    }
}

/// Decode the stored counter. Absent and corrupt values read as zero.
pub(super) fn parse_count(raw: Option<&str>) -> u64 {
    let Some(raw) = raw else {
        return 0;
    };
    match raw.trim().parse::<u64>() {
        Ok(count) => count,
        Err(e) => {
            warn!("ignoring unparsable {COUNT_KEY} value {raw:?}: {e}");
            0
        }
    }
}

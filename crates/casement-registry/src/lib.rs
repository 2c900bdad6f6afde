//! Cross-context window registry.
//!
//! Each context (a window, tab, or process) owns one [`WindowRegistry`].
//! Registries never talk to each other directly: they mirror a shared list
//! of [`WindowEntry`](casement_common::WindowEntry)s into a
//! [`SharedStore`](casement_store::SharedStore) and react to the store's
//! change notifications.

pub mod registry;
pub mod shape;

pub use registry::{did_windows_change, WindowRegistry};
pub use shape::{FixedShape, ShapeSource, SharedShape};

/// Store key holding the JSON-encoded window list.
pub const WINDOWS_KEY: &str = "windows";

/// Store key holding the shared registration counter.
pub const COUNT_KEY: &str = "count";

//! Shared store configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which shared store implementation backs the registry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum StoreBackend {
    /// One file per key in a directory shared by every process.
    #[default]
    File,
    /// Process-local; only useful for demos and tests.
    Memory,
}

/// Shared store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Store directory for the file backend. Empty means the platform
    /// data directory.
    pub path: PathBuf,
    /// Buffered change notifications per subscriber (valid range: 1-65536).
    pub channel_capacity: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            path: PathBuf::new(),
            channel_capacity: 256,
        }
    }
}

//! Configuration schema types for Casement.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod store;
mod sync;
mod system;

pub use store::*;
pub use sync::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for Casement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct CasementConfig {
    pub store: StoreConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

// =============================================================================
// Tests
// =============================================================================

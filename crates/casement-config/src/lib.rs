//! Casement configuration.
//!
//! TOML-based configuration for the shared store, the shape polling
//! cadence, and logging. All sections use defaults so partial configs
//! work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use casement_config::{load_config, resolve_store_dir};
//!
//! let config = load_config().expect("failed to load config");
//! let dir = resolve_store_dir(&config.store).expect("no data dir");
//! println!("store at {}", dir.display());
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{CasementConfig, StoreBackend, CONFIG_SCHEMA_VERSION};

use casement_common::ConfigError;
use schema::StoreConfig;
use std::path::{Path, PathBuf};

/// Load config from the platform default path and validate it.
pub fn load_config() -> Result<CasementConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

/// Load config from an explicit path and validate it.
pub fn load_config_from(path: &Path) -> Result<CasementConfig, ConfigError> {
    let config = toml_loader::load_from_path(path)?;
    validation::validate(&config)?;
    Ok(config)
}

/// The directory the file store should use: the configured path, or the
/// platform default when the path is empty.
pub fn resolve_store_dir(store: &StoreConfig) -> Result<PathBuf, ConfigError> {
    if store.path.as_os_str().is_empty() {
        toml_loader::default_store_dir()
    } else {
        Ok(store.path.clone())
    }
}

//! Reading `config.toml` from an explicit path or the platform default.

use std::io;
use std::path::Path;

use casement_common::ConfigError;
use tracing::{debug, info, warn};

use super::paths::{create_default_config, default_config_path};
use crate::schema::CasementConfig;
use crate::validation;

/// Read and parse the config at `path`.
///
/// A missing file is reported as [`ConfigError::FileNotFound`] so callers
/// can tell "no config yet" apart from a broken one. Out-of-range values
/// only produce a warning here; [`crate::load_config_from`] is the strict
/// entry point.
pub fn load_from_path(path: &Path) -> Result<CasementConfig, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(ConfigError::ParseError(format!(
                "failed to read {}: {e}",
                path.display()
            )))
        }
    };

    let config: CasementConfig = toml::from_str(&content).map_err(|e| {
        ConfigError::ParseError(format!("{} is not a valid casement config: {e}", path.display()))
    })?;

    if let Err(e) = validation::validate(&config) {
        warn!("{}: {e}", path.display());
    }

    debug!(
        backend = ?config.store.backend,
        frame_rate = config.sync.frame_rate,
        "config parsed"
    );
    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load `<config_dir>/casement/config.toml`, writing the commented
/// template there first if no config exists yet.
pub fn load_default() -> Result<CasementConfig, ConfigError> {
    let path = default_config_path()?;

    match load_from_path(&path) {
        Err(ConfigError::FileNotFound(_)) => {
            create_default_config(&path)?;
            info!("wrote default config to {}", path.display());
            Ok(CasementConfig::default())
        }
        result => result,
    }
}

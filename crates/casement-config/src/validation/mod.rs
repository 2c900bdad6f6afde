//! Configuration validation.
//!
//! Collects every out-of-range value into a single `ConfigError`.

mod helpers;


use crate::schema::CasementConfig;
use casement_common::ConfigError;

use helpers::validate_range;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &CasementConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_range(
        &mut errors,
        "store.channel_capacity",
        config.store.channel_capacity,
        1,
        65536,
    );
    validate_range(&mut errors, "sync.frame_rate", config.sync.frame_rate, 1, 240);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

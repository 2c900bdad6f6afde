//! Key names double as file names, so they are restricted to a safe set.

use casement_common::StoreError;

/// Accept non-empty keys made of ASCII letters, digits, `_` and `-`.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

pub(crate) fn is_valid_key(key: &str) -> bool {
    validate_key(key).is_ok()
}

use std::path::PathBuf;

use crate::Shape;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid store key: {0:?}")]
    InvalidKey(String),

    #[error("store watch error: {0}")]
    Watch(String),

    #[error("store lock poisoned")]
    Poisoned,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("window is not registered yet")]
    NotRegistered,

    #[error("window is already registered")]
    AlreadyRegistered,

    #[error("window has been deregistered")]
    Deregistered,

    #[error("shape {0} has a non-finite component")]
    InvalidShape(Shape),

    #[error("failed to encode windows: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum CasementError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub mod errors;
pub mod id;
pub mod types;

pub use errors::{CasementError, ConfigError, RegistryError, StoreError};
pub use id::{new_id, ContextId};
pub use types::{RegistrationState, Shape, WindowEntry, WindowId};

pub type Result<T> = std::result::Result<T, CasementError>;

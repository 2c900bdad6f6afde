//! Directory-backed shared store.
//!
//! Each key lives in its own file named after the key. Writes go through a
//! temp file and a rename so readers never see a torn value. A `notify`
//! watcher on the directory turns writes from other processes into
//! [`StorageEvent`](crate::StorageEvent)s.

mod keys;
mod store;
mod watcher;


pub use keys::validate_key;
pub use store::FileStore;

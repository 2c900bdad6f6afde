//! The WindowRegistry keeps one context's entry in the shared window list
//! and tracks everyone else's.

mod external;
mod lifecycle;
mod sync;
mod types;

#[cfg(test)]
mod tests;

pub use external::did_windows_change;
pub use types::*;

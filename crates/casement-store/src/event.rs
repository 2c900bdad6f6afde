/// A change to one key, as seen by a context that did not make it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl StorageEvent {
    pub fn new(
        key: impl Into<String>,
        old_value: Option<String>,
        new_value: Option<String>,
    ) -> Self {
        Self {
            key: key.into(),
            old_value,
            new_value,
        }
    }

    pub fn is_for(&self, key: &str) -> bool {
        self.key == key
    }
}

/// An event tagged with the handle that caused it. `None` means the write
/// came from outside this process.
#[derive(Debug, Clone)]
pub(crate) struct Envelope {
    pub origin: Option<u64>,
    pub event: StorageEvent,
}

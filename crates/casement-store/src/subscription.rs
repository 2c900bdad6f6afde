use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tracing::warn;

use crate::event::{Envelope, StorageEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubscriptionError {
    #[error("subscription lagged, {0} notifications dropped")]
    Lagged(u64),

    #[error("store closed")]
    Closed,
}

/// Receives change notifications for writes made by other handles.
pub struct Subscription {
    rx: broadcast::Receiver<Envelope>,
    origin: Option<u64>,
}

impl Subscription {
    /// `origin` is the handle whose own writes should be filtered out.
    pub(crate) fn new(rx: broadcast::Receiver<Envelope>, origin: Option<u64>) -> Self {
        Self { rx, origin }
    }

    fn is_own(&self, envelope: &Envelope) -> bool {
        self.origin.is_some() && envelope.origin == self.origin
    }

    /// Next pending notification without blocking.
    ///
    /// After `Lagged` the subscription resumes with the oldest notification
    /// still buffered.
    pub fn try_next(&mut self) -> Result<Option<StorageEvent>, SubscriptionError> {
        loop {
            match self.rx.try_recv() {
                Ok(envelope) if self.is_own(&envelope) => continue,
                Ok(envelope) => return Ok(Some(envelope.event)),
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Lagged(n)) => return Err(SubscriptionError::Lagged(n)),
                Err(TryRecvError::Closed) => return Err(SubscriptionError::Closed),
            }
        }
    }

    /// Wait for the next notification. Returns `None` once the store is gone.
    pub async fn next(&mut self) -> Option<StorageEvent> {
        loop {
            match self.rx.recv().await {
                Ok(envelope) if self.is_own(&envelope) => continue,
                Ok(envelope) => return Some(envelope.event),
                Err(RecvError::Lagged(n)) => {
                    warn!("store subscription lagged by {n} notifications");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

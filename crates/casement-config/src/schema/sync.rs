//! Polling cadence for shape-change detection.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Shape polls per second (valid range: 1-240).
    pub frame_rate: u32,
}

impl SyncConfig {
    /// Time between two polls. A zero frame rate is clamped to one per second.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.frame_rate.max(1)))
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { frame_rate: 60 }
    }
}

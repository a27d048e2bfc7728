//! Notice queue settings

use crate::notice::{DEFAULT_NOTICE_CAPACITY, DEFAULT_NOTICE_DURATION};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticeConfig {
    /// Notices retained before the oldest is evicted
    pub capacity: usize,
    /// Display time for notices that don't specify one
    pub default_duration_ms: u64,
}

impl NoticeConfig {
    pub fn default_duration(&self) -> Duration {
        Duration::from_millis(self.default_duration_ms)
    }
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_NOTICE_CAPACITY,
            default_duration_ms: DEFAULT_NOTICE_DURATION.as_millis() as u64,
        }
    }
}

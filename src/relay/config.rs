//! Configuration for the realtime relay.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the push-channel relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Seconds between liveness probes on an open connection
    pub ping_interval_seconds: u64,
    /// Delay before the first reconnect attempt; doubles on each failure
    pub reconnect_base_delay_ms: u64,
    /// Upper bound for the reconnect delay
    pub reconnect_max_delay_ms: u64,
    /// Automatic reconnect attempts before going idle
    pub max_reconnect_attempts: u32,
    /// Seconds an opening handshake may take before it counts as a failure
    pub connect_timeout_seconds: u64,
}

impl RelayConfig {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_seconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            ping_interval_seconds: 30,
            reconnect_base_delay_ms: 1000,
            reconnect_max_delay_ms: 30_000,
            max_reconnect_attempts: 5,
            connect_timeout_seconds: 10,
        }
    }
}

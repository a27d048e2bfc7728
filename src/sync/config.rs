//! Configuration for periodic cache refresh.

use serde::{Deserialize, Serialize};

/// How often desks and reservations are re-fetched over REST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Whether the background refresh runs at all
    pub enabled: bool,
    /// Seconds between refresh cycles
    pub interval_seconds: u64,
    /// Also refresh reservations, not just desks
    pub include_reservations: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 60,
            include_reservations: true,
        }
    }
}

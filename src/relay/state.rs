//! Observable relay state.

use serde::Serialize;
use std::fmt;

/// Lifecycle of the push connection.
///
/// `Closed` covers the wait for a scheduled reconnect; `Idle` is terminal
/// until the next external `connect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Open,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Point-in-time view of the relay, published on every change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RelaySnapshot {
    pub state: ConnectionState,
    /// Consecutive failed attempts since the last successful open
    pub reconnect_attempts: u32,
    /// Round trip of the most recent pong
    pub last_latency_ms: Option<i64>,
    /// Text frames received since the relay was spawned
    pub frames_received: u64,
    /// Frames dropped because they were not valid events
    pub frames_dropped: u64,
}

impl RelaySnapshot {
    pub fn connected(&self) -> bool {
        self.state == ConnectionState::Open
    }
}

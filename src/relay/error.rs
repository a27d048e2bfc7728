//! Error types for the realtime relay.

use thiserror::Error;

/// Transport-level failures. None of them is fatal: each one ends the current
/// connection and hands control to the reconnect schedule.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RelayError {
    /// Opening handshake failed
    #[error("connection failed: {0}")]
    Connect(String),

    /// Opening handshake did not finish in time
    #[error("connection attempt timed out after {0}s")]
    ConnectTimeout(u64),

    /// Read or write failed on an open connection
    #[error("transport error: {0}")]
    Transport(String),

    /// Outbound message could not be serialized
    #[error("failed to encode message: {0}")]
    Encode(String),
}

/// Inbound frame that is not a valid push event.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// Not JSON at all
    #[error("frame is not valid JSON: {0}")]
    NotJson(String),

    /// JSON, but missing `type` or carrying ill-typed fields
    #[error("malformed event: {0}")]
    Malformed(String),
}

//! Push-channel wire format.
//!
//! Every frame is a JSON object discriminated by its `type` field. Inbound
//! frames are validated here, at the boundary, into [`InboundEvent`]; anything
//! that fails validation becomes a [`ProtocolError`] and never reaches dispatch.

use super::error::{ProtocolError, RelayError};
use crate::cache::{DeskId, DeskStatus, ReservationId, ReservationStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Actor name the server uses for updates it made itself.
pub const SYSTEM_ACTOR: &str = "system";

/// What happened to a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationAction {
    Created,
    Updated,
    Deleted,
}

impl fmt::Display for ReservationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReservationAction::Created => "created",
            ReservationAction::Updated => "updated",
            ReservationAction::Deleted => "deleted",
        };
        f.write_str(s)
    }
}

/// Status carried by a `desk_status_update` frame.
///
/// The server rebroadcasts whatever a client sent, so values outside
/// [`DeskStatus`] are kept as text instead of failing the whole frame.
///
/// ```
/// use deskrelay::cache::DeskStatus;
/// use deskrelay::relay::ReportedStatus;
///
/// let known: ReportedStatus = serde_json::from_str(r#""occupied""#).unwrap();
/// assert_eq!(known.known(), Some(DeskStatus::Occupied));
///
/// let other: ReportedStatus = serde_json::from_str(r#""busy""#).unwrap();
/// assert_eq!(other.known(), None);
/// assert_eq!(other.to_string(), "busy");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ReportedStatus {
    Known(DeskStatus),
    Unknown(String),
}

impl ReportedStatus {
    pub fn known(&self) -> Option<DeskStatus> {
        match self {
            ReportedStatus::Known(status) => Some(*status),
            ReportedStatus::Unknown(_) => None,
        }
    }
}

impl From<DeskStatus> for ReportedStatus {
    fn from(status: DeskStatus) -> Self {
        ReportedStatus::Known(status)
    }
}

impl fmt::Display for ReportedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportedStatus::Known(status) => fmt::Display::fmt(status, f),
            ReportedStatus::Unknown(raw) => f.write_str(raw),
        }
    }
}

/// Payload of a `desk_status_update` frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeskStatusUpdate {
    pub desk_id: DeskId,
    pub status: ReportedStatus,
    #[serde(default)]
    pub updated_by: Option<String>,
}

/// Payload of a `reservation_update` frame.
///
/// The server only includes `status` when it changed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReservationUpdate {
    pub reservation_id: ReservationId,
    #[serde(default)]
    pub status: Option<ReservationStatus>,
    pub action: ReservationAction,
    #[serde(default)]
    pub updated_by: Option<String>,
}

/// Server-to-client event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    /// Greeting sent right after the server accepts the connection
    ConnectionEstablished {
        #[serde(default)]
        message: Option<String>,
    },
    /// Echo of a client ping
    Pong {
        #[serde(default)]
        timestamp: Option<f64>,
    },
    DeskStatusUpdate(DeskStatusUpdate),
    ReservationUpdate(ReservationUpdate),
    /// Well-formed frame with a `type` this client does not know
    #[serde(other)]
    Unrecognized,
}

impl InboundEvent {
    /// Parse one text frame.
    ///
    /// ```
    /// use deskrelay::relay::{InboundEvent, ProtocolError};
    ///
    /// let event = InboundEvent::parse(r#"{"type":"pong","timestamp":1700000000000}"#).unwrap();
    /// assert_eq!(event.kind(), "pong");
    ///
    /// assert!(matches!(InboundEvent::parse("hello"), Err(ProtocolError::NotJson(_))));
    /// assert!(matches!(InboundEvent::parse("{}"), Err(ProtocolError::Malformed(_))));
    /// ```
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(|e| {
            if e.is_syntax() || e.is_eof() {
                ProtocolError::NotJson(e.to_string())
            } else {
                ProtocolError::Malformed(e.to_string())
            }
        })
    }

    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::ConnectionEstablished { .. } => "connection_established",
            InboundEvent::Pong { .. } => "pong",
            InboundEvent::DeskStatusUpdate(_) => "desk_status_update",
            InboundEvent::ReservationUpdate(_) => "reservation_update",
            InboundEvent::Unrecognized => "unrecognized",
        }
    }
}

/// Client-to-server message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Liveness probe; the server echoes the timestamp back in a pong
    Ping { timestamp: i64 },
    /// Ask the server to broadcast a desk status change
    DeskStatusUpdate { desk_id: DeskId, status: DeskStatus },
    /// Ask the server to broadcast a reservation change
    ReservationUpdate {
        reservation_id: ReservationId,
        action: ReservationAction,
    },
}

impl OutboundMessage {
    /// Ping stamped with the current wall-clock time in milliseconds.
    pub fn ping_now() -> Self {
        OutboundMessage::Ping {
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMessage::Ping { .. } => "ping",
            OutboundMessage::DeskStatusUpdate { .. } => "desk_status_update",
            OutboundMessage::ReservationUpdate { .. } => "reservation_update",
        }
    }

    /// Serialize to a text frame.
    pub fn encode(&self) -> Result<String, RelayError> {
        serde_json::to_string(self).map_err(|e| RelayError::Encode(e.to_string()))
    }
}

/// Push endpoint for a session. The credential travels in the path.
///
/// ```
/// use deskrelay::relay::endpoint_url;
///
/// assert_eq!(
///     endpoint_url("ws://localhost:8000/", "abc123"),
///     "ws://localhost:8000/ws/office/abc123/"
/// );
/// ```
pub fn endpoint_url(ws_url: &str, credential: &str) -> String {
    format!("{}/ws/office/{}/", ws_url.trim_end_matches('/'), credential)
}

//! Realtime status relay.
//!
//! Keeps one push connection per session to `{ws_url}/ws/office/{credential}/`,
//! probes it every `ping_interval_seconds`, reconnects with exponential
//! backoff after a close, and patches the shared [`OfficeCache`] as desk and
//! reservation events arrive. Updates made by somebody else also raise a
//! notice on the shared [`NoticeQueue`].
//!
//! The relay is a handle to a single background task. Handle methods never
//! block; their effects are observable through [`Relay::subscribe`].
//!
//! Known gap: a missing pong does not trigger a reconnect. Only a transport
//! close does, so a half-open connection can go unnoticed until the OS
//! reports it.

mod actor;
mod backoff;
mod config;
mod dispatch;
mod error;
mod protocol;
mod state;
mod transport;


pub use backoff::ReconnectPolicy;
pub use config::RelayConfig;
pub use dispatch::{dispatch, is_foreign_actor, DispatchContext, Dispatched};
pub use error::{ProtocolError, RelayError};
pub use protocol::{
    endpoint_url, DeskStatusUpdate, InboundEvent, OutboundMessage, ReportedStatus,
    ReservationAction, ReservationUpdate, SYSTEM_ACTOR,
};
pub use state::{ConnectionState, RelaySnapshot};
pub use transport::{Connector, Frame, FrameSink, FrameStream, Transport, WsConnector};

use crate::cache::OfficeCache;
use crate::notice::NoticeQueue;
use actor::{Command, RelayActor};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Handle to the relay task.
///
/// Cloning the handle is cheap; the task stops when [`Relay::shutdown`] is
/// called or the last handle is dropped.
#[derive(Clone)]
pub struct Relay {
    commands: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<RelaySnapshot>,
}

impl Relay {
    /// Spawn a relay that talks WebSocket to `ws_url`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        ws_url: impl Into<String>,
        config: RelayConfig,
        cache: Arc<OfficeCache>,
        notices: Arc<NoticeQueue>,
    ) -> (Self, JoinHandle<()>) {
        Self::spawn_with_connector(Arc::new(WsConnector), ws_url, config, cache, notices)
    }

    /// Spawn a relay over a custom transport.
    pub fn spawn_with_connector<C: Connector>(
        connector: Arc<C>,
        ws_url: impl Into<String>,
        config: RelayConfig,
        cache: Arc<OfficeCache>,
        notices: Arc<NoticeQueue>,
    ) -> (Self, JoinHandle<()>) {
        let (commands, receiver) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot) = watch::channel(RelaySnapshot::default());

        let actor = RelayActor::new(
            connector,
            ws_url.into(),
            config,
            cache,
            notices,
            snapshot_tx,
        );
        let handle = tokio::spawn(actor.run(receiver));

        (Self { commands, snapshot }, handle)
    }

    /// Open the push channel for a session, replacing any current connection.
    ///
    /// An empty credential is logged and ignored.
    pub fn connect(&self, credential: impl Into<String>) {
        self.command(Command::Connect(credential.into()));
    }

    /// Close the push channel and cancel the probe and any pending reconnect.
    pub fn disconnect(&self) {
        self.command(Command::Disconnect);
    }

    /// Transmit a message if the channel is open; dropped otherwise.
    pub fn send(&self, message: OutboundMessage) {
        self.command(Command::Send(message));
    }

    /// Set the username whose own updates should not raise notices.
    pub fn set_identity(&self, identity: Option<String>) {
        self.command(Command::SetIdentity(identity));
    }

    /// Disconnect and stop the background task.
    pub fn shutdown(&self) {
        self.command(Command::Shutdown);
    }

    pub fn snapshot(&self) -> RelaySnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.snapshot.borrow().state
    }

    /// Watch every snapshot change.
    pub fn subscribe(&self) -> watch::Receiver<RelaySnapshot> {
        self.snapshot.clone()
    }

    fn command(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::debug!("Relay task already stopped, command dropped");
        }
    }
}

//! The task that owns the push connection.
//!
//! Everything that touches the socket, the probe timer, the reconnect timer
//! or the attempt counter runs here, one step at a time. Commands are always
//! polled before I/O and timers, so a `disconnect` wins over a probe or a
//! reconnect that became due in the same turn.

use super::backoff::ReconnectPolicy;
use super::config::RelayConfig;
use super::dispatch::{dispatch, DispatchContext, Dispatched};
use super::error::RelayError;
use super::protocol::{endpoint_url, InboundEvent, OutboundMessage};
use super::state::{ConnectionState, RelaySnapshot};
use super::transport::{Connector, Frame, Transport};
use crate::cache::OfficeCache;
use crate::notice::NoticeQueue;
use futures::future::BoxFuture;
use futures::{FutureExt, SinkExt, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{Interval, MissedTickBehavior, Sleep};

/// Upper bound on a graceful close before the socket is simply dropped.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Requests from [`super::Relay`] handles.
#[derive(Debug)]
pub(crate) enum Command {
    Connect(String),
    Disconnect,
    Send(OutboundMessage),
    SetIdentity(Option<String>),
    Shutdown,
}

enum Phase {
    Idle,
    Connecting(BoxFuture<'static, Result<Transport, RelayError>>),
    Open {
        transport: Transport,
        probe: Interval,
    },
    /// Waiting for the scheduled reconnect
    Closed { retry: Pin<Box<Sleep>> },
}

enum Step {
    Command(Command),
    Opened(Result<Transport, RelayError>),
    Frame(Option<Result<Frame, RelayError>>),
    Probe,
    Retry,
    HandlesDropped,
}

pub(crate) struct RelayActor<C: Connector> {
    connector: Arc<C>,
    ws_url: String,
    config: RelayConfig,
    policy: ReconnectPolicy,
    cache: Arc<OfficeCache>,
    notices: Arc<NoticeQueue>,
    identity: Option<String>,
    credential: Option<String>,
    reconnect_attempts: u32,
    snapshot: watch::Sender<RelaySnapshot>,
}

impl<C: Connector> RelayActor<C> {
    pub(crate) fn new(
        connector: Arc<C>,
        ws_url: String,
        config: RelayConfig,
        cache: Arc<OfficeCache>,
        notices: Arc<NoticeQueue>,
        snapshot: watch::Sender<RelaySnapshot>,
    ) -> Self {
        let policy = ReconnectPolicy::from(&config);
        Self {
            connector,
            ws_url,
            config,
            policy,
            cache,
            notices,
            identity: None,
            credential: None,
            reconnect_attempts: 0,
            snapshot,
        }
    }

    pub(crate) async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let mut phase = Phase::Idle;

        loop {
            let step = match &mut phase {
                Phase::Idle => match commands.recv().await {
                    Some(command) => Step::Command(command),
                    None => Step::HandlesDropped,
                },
                Phase::Connecting(opening) => tokio::select! {
                    biased;
                    command = commands.recv() => Step::from_command(command),
                    result = opening => Step::Opened(result),
                },
                Phase::Open { transport, probe } => tokio::select! {
                    biased;
                    command = commands.recv() => Step::from_command(command),
                    frame = transport.stream.next() => Step::Frame(frame),
                    _ = probe.tick() => Step::Probe,
                },
                Phase::Closed { retry } => tokio::select! {
                    biased;
                    command = commands.recv() => Step::from_command(command),
                    _ = retry.as_mut() => Step::Retry,
                },
            };

            phase = match step {
                Step::Command(Command::Shutdown) | Step::HandlesDropped => {
                    self.close(phase).await;
                    self.publish(|s| s.state = ConnectionState::Idle);
                    tracing::debug!("Relay task stopped");
                    break;
                }
                Step::Command(command) => self.on_command(phase, command).await,
                Step::Opened(Ok(transport)) => self.on_open(transport),
                Step::Opened(Err(e)) => {
                    tracing::warn!(error = %e, attempt = self.reconnect_attempts, "Push channel failed to open");
                    self.on_closed()
                }
                Step::Frame(Some(Ok(Frame::Text(text)))) => {
                    self.on_text(&text);
                    phase
                }
                Step::Frame(Some(Ok(Frame::Close))) | Step::Frame(None) => {
                    tracing::info!("Push channel disconnected");
                    self.on_closed()
                }
                Step::Frame(Some(Err(e))) => {
                    // The close that follows drives the reconnect
                    tracing::warn!(error = %e, "Push channel transport error");
                    phase
                }
                Step::Probe => {
                    self.transmit(phase, OutboundMessage::ping_now()).await
                }
                Step::Retry => {
                    self.reconnect_attempts += 1;
                    metrics::counter!("deskrelay_reconnects_total").increment(1);
                    tracing::info!(attempt = self.reconnect_attempts, "Reconnecting push channel");
                    self.begin_connect()
                }
            };
        }
    }

    async fn on_command(&mut self, phase: Phase, command: Command) -> Phase {
        match command {
            Command::Connect(credential) => {
                if credential.trim().is_empty() {
                    tracing::error!("Push channel connection requires a credential");
                    return phase;
                }
                self.close(phase).await;
                self.credential = Some(credential);
                self.reconnect_attempts = 0;
                self.begin_connect()
            }
            Command::Disconnect => {
                self.close(phase).await;
                self.credential = None;
                self.publish(|s| {
                    s.state = ConnectionState::Idle;
                    s.reconnect_attempts = 0;
                });
                self.reconnect_attempts = 0;
                Phase::Idle
            }
            Command::Send(message) => self.transmit(phase, message).await,
            Command::SetIdentity(identity) => {
                tracing::debug!(identity = ?identity, "Relay identity changed");
                self.identity = identity;
                phase
            }
            // Handled by the run loop
            Command::Shutdown => phase,
        }
    }

    fn begin_connect(&mut self) -> Phase {
        let Some(credential) = self.credential.as_deref() else {
            self.publish(|s| s.state = ConnectionState::Idle);
            return Phase::Idle;
        };

        let url = endpoint_url(&self.ws_url, credential);
        let connector = Arc::clone(&self.connector);
        let timeout = self.config.connect_timeout();

        tracing::debug!(ws_url = %self.ws_url, attempt = self.reconnect_attempts, "Opening push channel");
        let attempts = self.reconnect_attempts;
        self.publish(|s| {
            s.state = ConnectionState::Connecting;
            s.reconnect_attempts = attempts;
        });

        let opening = async move {
            match tokio::time::timeout(timeout, connector.connect(&url)).await {
                Ok(result) => result,
                Err(_) => Err(RelayError::ConnectTimeout(timeout.as_secs())),
            }
        };
        Phase::Connecting(opening.boxed())
    }

    fn on_open(&mut self, transport: Transport) -> Phase {
        self.reconnect_attempts = 0;
        self.publish(|s| {
            s.state = ConnectionState::Open;
            s.reconnect_attempts = 0;
        });
        tracing::info!(ws_url = %self.ws_url, "Push channel connected");

        let period = self.config.ping_interval().max(Duration::from_secs(1));
        let mut probe = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        probe.set_missed_tick_behavior(MissedTickBehavior::Skip);

        Phase::Open { transport, probe }
    }

    /// Decide what follows a lost or failed connection.
    fn on_closed(&mut self) -> Phase {
        let attempts = self.reconnect_attempts;

        if !self.policy.should_retry(attempts) {
            tracing::warn!(
                attempts,
                max_attempts = self.policy.max_attempts(),
                "Reconnect budget exhausted, push channel idle"
            );
            self.publish(|s| {
                s.state = ConnectionState::Idle;
                s.reconnect_attempts = attempts;
            });
            return Phase::Idle;
        }

        let delay = self.policy.delay_for(attempts);
        tracing::info!(
            delay_ms = delay.as_millis() as u64,
            attempt = attempts + 1,
            "Push channel reconnect scheduled"
        );
        self.publish(|s| {
            s.state = ConnectionState::Closed;
            s.reconnect_attempts = attempts;
        });

        Phase::Closed {
            retry: Box::pin(tokio::time::sleep(delay)),
        }
    }

    fn on_text(&mut self, text: &str) {
        self.publish(|s| s.frames_received += 1);

        let event = match InboundEvent::parse(text) {
            Ok(event) => event,
            Err(e) => {
                metrics::counter!("deskrelay_frames_dropped_total").increment(1);
                tracing::warn!(error = %e, frame_len = text.len(), "Dropping malformed push frame");
                self.publish(|s| s.frames_dropped += 1);
                return;
            }
        };

        metrics::counter!("deskrelay_events_total", "type" => event.kind()).increment(1);

        let ctx = DispatchContext {
            cache: &self.cache,
            notices: &self.notices,
            identity: self.identity.as_deref(),
            now_ms: chrono::Utc::now().timestamp_millis(),
        };

        if let Dispatched::Latency(Some(latency_ms)) = dispatch(&event, &ctx) {
            metrics::histogram!("deskrelay_pong_latency_seconds")
                .record(latency_ms.max(0) as f64 / 1000.0);
            self.publish(|s| s.last_latency_ms = Some(latency_ms));
        }
    }

    /// Best effort: only an open connection carries messages.
    async fn transmit(&mut self, mut phase: Phase, message: OutboundMessage) -> Phase {
        if let Phase::Open { transport, .. } = &mut phase {
            match message.encode() {
                Ok(text) => {
                    if let Err(e) = transport.sink.send(Frame::Text(text)).await {
                        tracing::warn!(error = %e, kind = message.kind(), "Failed to send push message");
                    }
                }
                Err(e) => tracing::error!(error = %e, "Dropping unencodable push message"),
            }
        } else {
            tracing::warn!(
                kind = message.kind(),
                "Cannot send message, push channel is not connected"
            );
        }
        phase
    }

    /// Tear down whatever the phase holds. Timers are dropped with it.
    async fn close(&mut self, phase: Phase) {
        if let Phase::Open { mut transport, .. } = phase {
            if tokio::time::timeout(CLOSE_TIMEOUT, transport.sink.close())
                .await
                .is_err()
            {
                tracing::debug!("Graceful close timed out, dropping push channel");
            }
            tracing::info!("Push channel closed");
        }
    }

    fn publish(&self, modify: impl FnOnce(&mut RelaySnapshot)) {
        self.snapshot.send_modify(modify);
    }
}

impl Step {
    fn from_command(command: Option<Command>) -> Self {
        match command {
            Some(command) => Step::Command(command),
            None => Step::HandlesDropped,
        }
    }
}

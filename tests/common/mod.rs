//! Shared test utilities for deskrelay integration tests.
//!
//! Provides an in-process office push server that speaks the same frame
//! format as the real one.

#![allow(dead_code)]

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use deskrelay::relay::RelaySnapshot;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch, Mutex};

/// What the test wants the server to do to every open socket.
#[derive(Debug, Clone)]
pub enum ServerAction {
    Push(String),
    /// Drop the connection without a close frame
    Kick,
}

struct ServerState {
    actions: broadcast::Sender<ServerAction>,
    received: mpsc::UnboundedSender<(String, String)>,
    connections: AtomicUsize,
}

/// Push server bound to a random local port.
pub struct OfficeServer {
    pub addr: SocketAddr,
    state: Arc<ServerState>,
    received: Mutex<mpsc::UnboundedReceiver<(String, String)>>,
}

impl OfficeServer {
    pub async fn start() -> Self {
        let (actions, _) = broadcast::channel(64);
        let (received_tx, received_rx) = mpsc::unbounded_channel();
        let state = Arc::new(ServerState {
            actions,
            received: received_tx,
            connections: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/ws/office/:token/", get(ws_handler))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            received: Mutex::new(received_rx),
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Connections accepted so far
    pub fn connections(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }

    pub fn push(&self, frame: serde_json::Value) {
        let _ = self.state.actions.send(ServerAction::Push(frame.to_string()));
    }

    pub fn kick_all(&self) {
        let _ = self.state.actions.send(ServerAction::Kick);
    }

    /// Next client frame other than a ping, with the token it arrived on.
    pub async fn next_message(&self) -> (String, serde_json::Value) {
        let mut received = self.received.lock().await;
        loop {
            let (token, text) = tokio::time::timeout(Duration::from_secs(5), received.recv())
                .await
                .expect("no client message within 5s")
                .expect("server stopped");
            let value: serde_json::Value = serde_json::from_str(&text).unwrap();
            if value["type"] != "ping" {
                return (token, value);
            }
        }
    }
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(token): Path<String>,
    State(state): State<Arc<ServerState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, token, state))
}

async fn handle_socket(socket: WebSocket, token: String, state: Arc<ServerState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut actions = state.actions.subscribe();
    state.connections.fetch_add(1, Ordering::SeqCst);

    let greeting = serde_json::json!({
        "type": "connection_established",
        "message": "Connected to office updates"
    });
    if sender.send(Message::Text(greeting.to_string())).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            action = actions.recv() => match action {
                Ok(ServerAction::Push(text)) => {
                    if sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Ok(ServerAction::Kick) | Err(_) => break,
            },
            message = receiver.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    let value: serde_json::Value =
                        serde_json::from_str(&text).unwrap_or_default();
                    if value["type"] == "ping" {
                        let pong = serde_json::json!({
                            "type": "pong",
                            "timestamp": value["timestamp"]
                        });
                        if sender.send(Message::Text(pong.to_string())).await.is_err() {
                            break;
                        }
                    }
                    let _ = state.received.send((token.clone(), text));
                }
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }
}

/// Wait until the relay snapshot satisfies `predicate`.
pub async fn wait_for_snapshot(
    rx: &mut watch::Receiver<RelaySnapshot>,
    predicate: impl FnMut(&RelaySnapshot) -> bool,
) -> RelaySnapshot {
    tokio::time::timeout(Duration::from_secs(10), rx.wait_for(predicate))
        .await
        .expect("relay did not reach expected state")
        .expect("relay task stopped")
        .clone()
}

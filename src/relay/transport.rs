//! Transport seam between the relay actor and the network.
//!
//! The actor only sees text frames flowing through a boxed sink and stream,
//! so tests can drive it over in-memory channels instead of a real socket.

use super::error::RelayError;
use async_trait::async_trait;
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::pin::Pin;
use tokio_tungstenite::tungstenite::Message;

/// A unit of traffic on the push channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    /// Peer started the closing handshake
    Close,
}

pub type FrameSink = Pin<Box<dyn Sink<Frame, Error = RelayError> + Send>>;
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Frame, RelayError>> + Send>>;

/// An open connection, split into its two halves.
pub struct Transport {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

/// Opens push-channel connections.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Open a connection to `url`. The stream ends when the connection closes.
    async fn connect(&self, url: &str) -> Result<Transport, RelayError>;
}

/// WebSocket connector backed by tokio-tungstenite.
#[derive(Debug, Default, Clone)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Transport, RelayError> {
        let (socket, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| RelayError::Connect(e.to_string()))?;

        let (sink, stream) = socket.split();

        let sink = sink
            .sink_map_err(|e| RelayError::Transport(e.to_string()))
            .with(|frame: Frame| {
                futures::future::ready(Ok::<_, RelayError>(match frame {
                    Frame::Text(text) => Message::Text(text.into()),
                    Frame::Close => Message::Close(None),
                }))
            });

        // Control frames are answered by tungstenite itself
        let stream = stream.filter_map(|message| {
            futures::future::ready(match message {
                Ok(Message::Text(text)) => Some(Ok(Frame::Text(text.as_str().to_owned()))),
                Ok(Message::Close(_)) => Some(Ok(Frame::Close)),
                Ok(Message::Binary(_)) => {
                    tracing::debug!("Ignoring binary frame on push channel");
                    None
                }
                Ok(_) => None,
                Err(e) => Some(Err(RelayError::Transport(e.to_string()))),
            })
        });

        Ok(Transport {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        })
    }
}

//! WebSocket transport to a host's `/1.0/events` endpoint.

use crate::transport::{EventConnection, EventTransport};
use crate::HubError;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::debug;

/// Default events path on the target.
pub const EVENTS_PATH: &str = "/1.0/events";

/// Connects to `ws://<target><path>`.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    path: String,
}

impl WebSocketTransport {
    /// Transport for the standard events path.
    #[must_use]
    pub fn new() -> Self {
        Self::with_path(EVENTS_PATH)
    }

    /// Transport for a custom path.
    #[must_use]
    pub fn with_path(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// URL dialled for `target`.
    pub fn url_for(&self, target: &str) -> String {
        format!("ws://{}{}", target, self.path)
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventTransport for WebSocketTransport {
    async fn connect(&self, target: &str) -> Result<Box<dyn EventConnection>, HubError> {
        let url = self.url_for(target);
        let (stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| HubError::Connect {
                target: target.to_string(),
                reason: e.to_string(),
            })?;
        debug!(url = %url, "WebSocket event connection opened");
        Ok(Box::new(WebSocketConnection { stream }))
    }
}

struct WebSocketConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl EventConnection for WebSocketConnection {
    async fn next_frame(&mut self) -> Result<Option<Vec<u8>>, HubError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_str().as_bytes().to_vec())),
                Some(Ok(Message::Binary(data))) => return Ok(Some(data.to_vec())),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                // Ping/pong are answered by tungstenite itself.
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(HubError::Transport(e.to_string())),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!(error = %e, "WebSocket close failed");
        }
    }
}

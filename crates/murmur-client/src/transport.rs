//! WebSocket and HTTP transport.
//!
//! [`WsDriver`] implements [`Driver`] over `tokio-tungstenite`. Commands go
//! out as CBOR in binary frames; inbound events are accepted as CBOR binary
//! frames or JSON text frames. [`HttpHistory`] implements [`HistorySource`]
//! with a single `GET` via `reqwest`.

use std::{future::Future, time::Instant};

use futures_util::{SinkExt, StreamExt};
use murmur_core::{FetchError, HistoryBatch};
use murmur_proto::{ClientCommand, ServerEvent};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::{Driver, HistorySource, TransportError};

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// [`Driver`] backed by a WebSocket connection.
#[derive(Default)]
pub struct WsDriver {
    ws: Option<WsStream>,
}

impl WsDriver {
    /// Create a driver with no open connection.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Driver for WsDriver {
    type Error = TransportError;
    type Instant = Instant;

    async fn open(&mut self, url: &str) -> Result<(), Self::Error> {
        self.close().await;

        let (ws, _response) =
            connect_async(url).await.map_err(|e| TransportError::Connection(e.to_string()))?;
        tracing::debug!(url, "websocket open");
        self.ws = Some(ws);
        Ok(())
    }

    async fn send(&mut self, command: ClientCommand) -> Result<(), Self::Error> {
        let ws = self.ws.as_mut().ok_or(TransportError::NotOpen)?;
        let payload = command.to_cbor()?;
        ws.send(Message::Binary(payload.into()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn recv(&mut self) -> Option<ServerEvent> {
        loop {
            let ws = self.ws.as_mut()?;
            let frame = match ws.next().await {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "websocket read failed");
                    self.ws = None;
                    return None;
                },
                None => {
                    self.ws = None;
                    return None;
                },
            };

            let decoded = match frame {
                Message::Binary(bytes) => ServerEvent::decode(&bytes),
                Message::Text(text) => ServerEvent::from_json(text.as_str()),
                Message::Close(close) => {
                    tracing::debug!(?close, "server closed websocket");
                    self.ws = None;
                    return None;
                },
                // Control frames; tungstenite answers pings itself.
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            };

            match decoded {
                Ok(event) => return Some(event),
                Err(e) => tracing::warn!(error = %e, "dropping undecodable frame"),
            }
        }
    }

    fn is_open(&self) -> bool {
        self.ws.is_some()
    }

    async fn close(&mut self) {
        if let Some(mut ws) = self.ws.take()
            && let Err(e) = ws.close(None).await
        {
            tracing::debug!(error = %e, "websocket close failed");
        }
    }

    fn now(&self) -> Self::Instant {
        Instant::now()
    }
}

/// [`HistorySource`] fetching a JSON message array over HTTP.
#[derive(Debug, Clone)]
pub struct HttpHistory {
    client: reqwest::Client,
    url: String,
}

impl HttpHistory {
    /// Fetch history from `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), url: url.into() }
    }

    /// Endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl HistorySource for HttpHistory {
    fn fetch(&self) -> impl Future<Output = Result<HistoryBatch, FetchError>> + Send + 'static {
        let client = self.client.clone();
        let url = self.url.clone();

        async move {
            let response = client.get(&url).send().await.map_err(request_error)?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }

            let body = response.bytes().await.map_err(request_error)?;
            let batch = HistoryBatch::from_json(&body)?;
            tracing::debug!(url = %url, count = batch.len(), "history received");
            Ok(batch)
        }
    }
}

fn request_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() { FetchError::Timeout } else { FetchError::Transport(err.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_without_connection_fails() {
        let mut driver = WsDriver::new();

        let result = driver.send(ClientCommand::Leave).await;

        assert!(matches!(result, Err(TransportError::NotOpen)));
        assert!(!driver.is_open());
    }

    #[tokio::test]
    async fn recv_without_connection_is_closed() {
        let mut driver = WsDriver::new();
        assert!(driver.recv().await.is_none());
    }

    #[tokio::test]
    async fn open_invalid_url_fails() {
        let mut driver = WsDriver::new();

        let result = driver.open("not a url").await;

        assert!(matches!(result, Err(TransportError::Connection(_))));
        assert!(!driver.is_open());
    }

    #[tokio::test]
    async fn unreachable_history_is_transport_error() {
        let history = HttpHistory::new("http://127.0.0.1:1/api/messages");

        let result = history.fetch().await;

        assert!(matches!(result, Err(FetchError::Transport(_))));
    }
}

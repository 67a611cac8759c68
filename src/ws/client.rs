//! Single-connection WebSocket client with ping keepalive
//!
//! There is no reconnection here: when the connection fails the stream ends
//! with an error and the owner decides whether to open a new one.

use super::types::{WsConfig, WsError, WsMessage};
use futures_util::stream::BoxStream;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket client factory
pub struct WsClient {
    config: WsConfig,
}

impl WsClient {
    /// Create a new WebSocket client with the given configuration
    pub fn new(config: WsConfig) -> Self {
        Self { config }
    }

    /// Perform the handshake and return the open connection
    pub async fn connect(&self) -> Result<WsConnection, WsError> {
        tracing::info!(url = %self.config.url, "Connecting to WebSocket");

        let (socket, _response) =
            tokio::time::timeout(self.config.connect_timeout, connect_async(&self.config.url))
                .await
                .map_err(|_| WsError::ConnectTimeout(self.config.connect_timeout))?
                .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;

        tracing::info!(url = %self.config.url, "WebSocket connected");

        let mut ping_interval = tokio::time::interval_at(
            Instant::now() + self.config.ping_interval,
            self.config.ping_interval,
        );
        ping_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        Ok(WsConnection {
            socket,
            ping_interval,
            waiting_for_pong: false,
            finished: false,
        })
    }
}

/// An open WebSocket connection
///
/// Dropping it closes the underlying socket.
pub struct WsConnection {
    socket: Socket,
    ping_interval: Interval,
    waiting_for_pong: bool,
    finished: bool,
}

impl WsConnection {
    /// Wait for the next application message
    ///
    /// Returns `None` once the connection has closed or failed. Ping/pong
    /// frames are handled here and never surfaced.
    pub async fn next_message(&mut self) -> Option<Result<WsMessage, WsError>> {
        if self.finished {
            return None;
        }

        let result = self.read_frame().await;
        if matches!(result, Err(_) | Ok(WsMessage::Closed)) {
            self.finished = true;
        }
        Some(result)
    }

    /// Turn the connection into a stream of messages
    pub fn into_stream(self) -> BoxStream<'static, Result<WsMessage, WsError>> {
        futures_util::stream::unfold(self, |mut conn| async move {
            conn.next_message().await.map(|item| (item, conn))
        })
        .boxed()
    }

    async fn read_frame(&mut self) -> Result<WsMessage, WsError> {
        loop {
            tokio::select! {
                msg = self.socket.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => return Ok(WsMessage::Text(text)),
                        Some(Ok(Message::Binary(data))) => return Ok(WsMessage::Binary(data)),
                        Some(Ok(Message::Ping(data))) => {
                            self.socket.send(Message::Pong(data)).await
                                .map_err(|e| WsError::SendFailed(e.to_string()))?;
                        }
                        Some(Ok(Message::Pong(_))) => {
                            self.waiting_for_pong = false;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            tracing::info!(?frame, "Received close frame");
                            return Ok(WsMessage::Closed);
                        }
                        Some(Ok(Message::Frame(_))) => {}
                        Some(Err(e)) => {
                            return Err(WsError::ConnectionFailed(e.to_string()));
                        }
                        None => {
                            return Err(WsError::ConnectionFailed("Stream ended unexpectedly".into()));
                        }
                    }
                }

                _ = self.ping_interval.tick() => {
                    if self.waiting_for_pong {
                        return Err(WsError::PongTimeout);
                    }
                    self.socket.send(Message::Ping(vec![])).await
                        .map_err(|e| WsError::SendFailed(e.to_string()))?;
                    self.waiting_for_pong = true;
                }
            }
        }
    }
}

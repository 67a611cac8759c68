//! WebSocket types and configuration

use std::time::Duration;

/// WebSocket client configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// WebSocket URL to connect to
    pub url: String,
    /// Upper bound on the TCP + TLS + upgrade handshake
    pub connect_timeout: Duration,
    /// Interval for sending ping frames; a missing pong by the next ping fails the connection
    pub ping_interval: Duration,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            connect_timeout: Duration::from_secs(10),
            ping_interval: Duration::from_secs(30),
        }
    }
}

impl WsConfig {
    /// Create a new config with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set handshake timeout
    pub fn connect_timeout(mut self, d: Duration) -> Self {
        self.connect_timeout = d;
        self
    }

    /// Set ping interval
    pub fn ping_interval(mut self, d: Duration) -> Self {
        self.ping_interval = d;
        self
    }
}

/// Messages surfaced from an open connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsMessage {
    /// Text message
    Text(String),
    /// Binary message
    Binary(Vec<u8>),
    /// Server sent a close frame; no further messages follow
    Closed,
}

/// WebSocket errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsError {
    /// Connection failed or broke while streaming
    ConnectionFailed(String),
    /// Handshake did not finish in time
    ConnectTimeout(Duration),
    /// No pong arrived between two pings
    PongTimeout,
    /// Send failed
    SendFailed(String),
}

impl std::fmt::Display for WsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WsError::ConnectionFailed(e) => write!(f, "Connection failed: {}", e),
            WsError::ConnectTimeout(d) => write!(f, "Connect timed out after {:?}", d),
            WsError::PongTimeout => write!(f, "Pong timeout"),
            WsError::SendFailed(e) => write!(f, "Send failed: {}", e),
        }
    }
}

impl std::error::Error for WsError {}

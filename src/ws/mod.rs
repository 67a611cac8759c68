//! WebSocket client library
//!
//! Provides a WebSocket connection with ping/pong keepalive and a
//! handshake timeout, exposed as an async message stream.

mod client;
mod types;

pub use client::{WsClient, WsConnection};
pub use types::{WsConfig, WsError, WsMessage};

//! Controller types

use crate::catalog::{CatalogError, Symbol};
use crate::feed::FeedError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Subscription lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerState {
    /// No subscription
    Idle,
    /// Subscription requested, feed not open yet
    Connecting,
    /// Feed open, messages flowing into the sample slot
    Streaming,
    /// Releasing the live subscription
    Closing,
    /// Subscription failed; passes straight back to Idle
    Errored,
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControllerState::Idle => "idle",
            ControllerState::Connecting => "connecting",
            ControllerState::Streaming => "streaming",
            ControllerState::Closing => "closing",
            ControllerState::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Direction of the last committed move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DirectionSignal {
    Up,
    Down,
    /// Fewer than two committed samples
    Unknown,
}

impl DirectionSignal {
    /// Compare two committed prices
    ///
    /// Equal prices are reported as `Down`.
    pub fn between(current: Option<f64>, previous: Option<f64>) -> Self {
        match (current, previous) {
            (Some(current), Some(previous)) if current > previous => DirectionSignal::Up,
            (Some(_), Some(_)) => DirectionSignal::Down,
            _ => DirectionSignal::Unknown,
        }
    }

    /// Arrow glyph for display; blank while unknown
    pub fn glyph(&self) -> &'static str {
        match self {
            DirectionSignal::Up => "↑",
            DirectionSignal::Down => "↓",
            DirectionSignal::Unknown => "",
        }
    }
}

/// A committed price
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceSample {
    /// Trade price
    pub price: f64,
    /// Local time the message arrived
    pub received_at: DateTime<Utc>,
    /// Exchange trade time, when known
    pub trade_time: Option<DateTime<Utc>>,
}

/// Kind of the most recent error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    CatalogUnavailable,
    TransportError,
    MessageDecodeFailed,
}

/// Errors surfaced to the consumer through the latest-error slot
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ControllerError {
    /// Symbol catalog could not be loaded
    #[error("Symbol catalog unavailable: {0}")]
    CatalogUnavailable(String),
    /// Subscription failed to open or broke; it has been closed
    #[error("Price feed connection error: {0}")]
    TransportError(String),
    /// A single feed message was unreadable; the subscription continues
    #[error("Failed to decode price message: {0}")]
    MessageDecodeFailed(String),
}

impl ControllerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ControllerError::CatalogUnavailable(_) => ErrorKind::CatalogUnavailable,
            ControllerError::TransportError(_) => ErrorKind::TransportError,
            ControllerError::MessageDecodeFailed(_) => ErrorKind::MessageDecodeFailed,
        }
    }
}

impl From<CatalogError> for ControllerError {
    fn from(e: CatalogError) -> Self {
        ControllerError::CatalogUnavailable(e.to_string())
    }
}

impl From<FeedError> for ControllerError {
    fn from(e: FeedError) -> Self {
        match e {
            FeedError::Decode(msg) => ControllerError::MessageDecodeFailed(msg),
            FeedError::Transport(msg) => ControllerError::TransportError(msg),
        }
    }
}

/// Snapshot of everything the presentation layer renders
#[derive(Debug, Clone, PartialEq)]
pub struct PriceView {
    /// Currently selected symbol
    pub symbol: Option<Symbol>,
    /// Subscription state
    pub state: ControllerState,
    /// Latest committed sample
    pub current: Option<PriceSample>,
    /// Sample committed before `current`
    pub previous: Option<PriceSample>,
    /// Selectable symbols, empty until the catalog has loaded
    pub catalog: Arc<Vec<Symbol>>,
    /// Most recent error, superseded by the next one
    pub last_error: Option<ControllerError>,
    /// Number of errors raised so far
    pub error_count: u64,
    /// Number of tick commits so far
    pub commits: u64,
}

impl PriceView {
    /// Direction between the two most recent commits
    pub fn direction(&self) -> DirectionSignal {
        DirectionSignal::between(
            self.current.map(|s| s.price),
            self.previous.map(|s| s.price),
        )
    }

    /// Whether `symbol` is in the loaded catalog
    pub fn is_listed(&self, symbol: &Symbol) -> bool {
        self.catalog.contains(symbol)
    }
}

impl Default for PriceView {
    fn default() -> Self {
        Self {
            symbol: None,
            state: ControllerState::Idle,
            current: None,
            previous: None,
            catalog: Arc::new(Vec::new()),
            last_error: None,
            error_count: 0,
            commits: 0,
        }
    }
}

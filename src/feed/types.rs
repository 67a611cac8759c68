//! Price feed types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A trade price decoded from one feed message
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeUpdate {
    /// Trade price
    pub price: f64,
    /// Exchange trade time, when the message carries one
    pub trade_time: Option<DateTime<Utc>>,
}

/// Price feed errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedError {
    /// A single message could not be decoded into a trade price
    #[error("Malformed feed message: {0}")]
    Decode(String),
    /// The subscription could not be opened or broke while streaming
    #[error("Feed transport failure: {0}")]
    Transport(String),
}

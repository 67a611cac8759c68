//! Catalog types

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Exchange instrument identifier (e.g., "BTCUSDT")
///
/// Opaque to the controller; only the feed cares that the stream key is the
/// lower-cased form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a symbol from any string-like identifier
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into().trim().to_string())
    }

    /// The identifier as returned by the exchange
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-cased form used as the feed stream key
    pub fn stream_key(&self) -> String {
        self.0.to_lowercase()
    }

    /// Whether the symbol is empty after trimming
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Instrument descriptor as published by the exchange metadata endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentDescriptor {
    /// Instrument identifier
    pub symbol: String,
    /// Trading status (e.g., "TRADING", "BREAK")
    pub status: String,
    /// Quote currency (e.g., "USDT")
    pub quote_asset: String,
}

/// Symbol catalog errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Request could not be sent or the body could not be read
    #[error("Catalog request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Endpoint answered with a non-success status
    #[error("Catalog endpoint returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    /// Body was not the expected exchangeInfo shape
    #[error("Malformed catalog response: {0}")]
    Decode(#[from] serde_json::Error),
}

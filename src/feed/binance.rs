//! Binance WebSocket trade feed implementation

use super::{FeedError, FeedStream, PriceFeed, TradeUpdate};
use crate::catalog::Symbol;
use crate::ws::{WsClient, WsConfig, WsError, WsMessage};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use futures_util::StreamExt;
use serde::Deserialize;
use std::time::Duration;

/// Binance WebSocket base URL
pub const BINANCE_WS_URL: &str = "wss://stream.binance.com:9443/ws";

/// Binance trade message structure
///
/// Only the price is required; everything else is carried when present.
#[derive(Debug, Deserialize)]
struct BinanceTradeMessage {
    /// Price
    #[serde(rename = "p")]
    price: String,
    /// Symbol
    #[serde(rename = "s")]
    #[allow(dead_code)]
    symbol: Option<String>,
    /// Trade time (milliseconds)
    #[serde(rename = "T")]
    trade_time: Option<i64>,
}

/// Binance `<symbol>@trade` stream
pub struct BinanceFeed {
    base_url: String,
    connect_timeout: Duration,
    ping_interval: Duration,
}

impl BinanceFeed {
    /// Create a feed against the public Binance stream endpoint
    pub fn new() -> Self {
        Self::with_base_url(BINANCE_WS_URL)
    }

    /// Create a feed against a custom stream endpoint
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let defaults = WsConfig::default();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            connect_timeout: defaults.connect_timeout,
            ping_interval: defaults.ping_interval,
        }
    }

    /// Set handshake timeout
    pub fn connect_timeout(mut self, d: Duration) -> Self {
        self.connect_timeout = d;
        self
    }

    /// Set keepalive ping interval
    pub fn ping_interval(mut self, d: Duration) -> Self {
        self.ping_interval = d;
        self
    }

    /// Build the WebSocket URL for the trade stream
    pub fn build_ws_url(&self, symbol: &Symbol) -> String {
        format!("{}/{}@trade", self.base_url, symbol.stream_key())
    }
}

impl Default for BinanceFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a trade message into its price
pub fn parse_trade_message(msg: &str) -> Result<TradeUpdate, FeedError> {
    let trade: BinanceTradeMessage =
        serde_json::from_str(msg).map_err(|e| FeedError::Decode(e.to_string()))?;

    let price: f64 = trade
        .price
        .trim()
        .parse()
        .map_err(|_| FeedError::Decode(format!("invalid price {:?}", trade.price)))?;

    if !price.is_finite() {
        return Err(FeedError::Decode(format!("non-finite price {:?}", trade.price)));
    }

    let trade_time = trade
        .trade_time
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single());

    Ok(TradeUpdate { price, trade_time })
}

/// Map a raw socket item onto the feed contract
///
/// Binary frames are handed on as lossy text so they fail trade decoding
/// like any other malformed message.
fn map_ws_item(item: Result<WsMessage, WsError>) -> Result<String, FeedError> {
    match item {
        Ok(WsMessage::Text(text)) => Ok(text),
        Ok(WsMessage::Binary(data)) => Ok(String::from_utf8_lossy(&data).into_owned()),
        Ok(WsMessage::Closed) => Err(FeedError::Transport("stream closed by server".to_string())),
        Err(e) => Err(FeedError::Transport(e.to_string())),
    }
}

#[async_trait]
impl PriceFeed for BinanceFeed {
    async fn open(&self, symbol: &Symbol) -> Result<FeedStream, FeedError> {
        let url = self.build_ws_url(symbol);

        tracing::info!(symbol = %symbol, url = %url, "Subscribing to Binance trade stream");

        let config = WsConfig::new(url)
            .connect_timeout(self.connect_timeout)
            .ping_interval(self.ping_interval);

        let connection = WsClient::new(config)
            .connect()
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        let stream = connection
            .into_stream()
            .map(map_ws_item)
            .boxed();

        Ok(stream)
    }
}

//! Price feed module
//!
//! Push-based trade price subscriptions, one symbol per stream

mod binance;
mod types;

pub use binance::{parse_trade_message, BinanceFeed, BINANCE_WS_URL};
pub use types::{FeedError, TradeUpdate};

use crate::catalog::Symbol;
use async_trait::async_trait;
use futures_util::stream::BoxStream;

/// Raw feed messages for one subscription
///
/// The subscription is live for as long as the stream is held; dropping it
/// releases the connection.
pub type FeedStream = BoxStream<'static, Result<String, FeedError>>;

/// Trait for price feed implementations
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Open a subscription to the trade stream of `symbol`
    async fn open(&self, symbol: &Symbol) -> Result<FeedStream, FeedError>;
}

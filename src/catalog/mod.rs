//! Symbol catalog module
//!
//! Loads the list of tradeable symbols from the exchange metadata endpoint

mod exchange_info;
mod types;

pub use exchange_info::{
    filter_tradeable, parse_exchange_info, CatalogClient, CatalogConfig, BINANCE_API_URL,
    TRADING_STATUS,
};
pub use types::{CatalogError, InstrumentDescriptor, Symbol};

use async_trait::async_trait;

/// Trait for symbol catalog sources
#[async_trait]
pub trait SymbolSource: Send + Sync {
    /// Load the ordered list of selectable symbols
    async fn load_symbols(&self) -> Result<Vec<Symbol>, CatalogError>;
}

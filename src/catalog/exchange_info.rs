//! Binance exchangeInfo client for the symbol catalog
//!
//! Fetches the full instrument list once and keeps only the instruments that
//! are currently trading against the configured settlement currency.

use super::types::{CatalogError, InstrumentDescriptor, Symbol};
use super::SymbolSource;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

/// Binance REST base URL
pub const BINANCE_API_URL: &str = "https://api.binance.com";

/// Status value for instruments open for trading
pub const TRADING_STATUS: &str = "TRADING";

/// Configuration for the catalog client
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL for the REST API
    pub base_url: String,
    /// Settlement currency every listed symbol must be quoted in
    pub quote_asset: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: BINANCE_API_URL.to_string(),
            quote_asset: "USDT".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Client for the exchange metadata endpoint
pub struct CatalogClient {
    config: CatalogConfig,
    client: Client,
}

impl CatalogClient {
    /// Create a new client with custom configuration
    pub fn with_config(config: CatalogConfig) -> Result<Self, CatalogError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// Settlement currency this client filters on
    pub fn quote_asset(&self) -> &str {
        &self.config.quote_asset
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/api/v3/exchangeInfo",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Fetch and filter the instrument list
    pub async fn fetch_symbols(&self) -> Result<Vec<Symbol>, CatalogError> {
        let url = self.endpoint();

        tracing::debug!(url = %url, "Fetching exchange info");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Status { status, body });
        }

        let body = response.text().await?;
        let descriptors = parse_exchange_info(&body)?;
        let total = descriptors.len();
        let symbols = filter_tradeable(&descriptors, &self.config.quote_asset);

        tracing::info!(
            total_instruments = total,
            tradeable = symbols.len(),
            quote_asset = %self.config.quote_asset,
            "Loaded symbol catalog"
        );

        Ok(symbols)
    }
}

#[async_trait]
impl SymbolSource for CatalogClient {
    async fn load_symbols(&self) -> Result<Vec<Symbol>, CatalogError> {
        self.fetch_symbols().await
    }
}

/// Raw exchangeInfo response; every other top-level field is ignored
#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    symbols: Vec<InstrumentDescriptor>,
}

/// Parse the exchangeInfo body into instrument descriptors
///
/// Any deviation from `{symbols: [{symbol, status, quoteAsset}]}` is an error,
/// so a partially valid body never yields entries.
pub fn parse_exchange_info(body: &str) -> Result<Vec<InstrumentDescriptor>, CatalogError> {
    let info: ExchangeInfo = serde_json::from_str(body)?;
    Ok(info.symbols)
}

/// Keep instruments that are trading and quoted in `quote_asset`
///
/// Source order is preserved; a repeated symbol keeps its first position.
pub fn filter_tradeable(descriptors: &[InstrumentDescriptor], quote_asset: &str) -> Vec<Symbol> {
    let mut seen = HashSet::new();
    descriptors
        .iter()
        .filter(|d| d.status == TRADING_STATUS && d.quote_asset == quote_asset)
        .filter(|d| seen.insert(d.symbol.as_str()))
        .map(|d| Symbol::new(d.symbol.as_str()))
        .collect()
}

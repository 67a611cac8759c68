//! Configuration types for price-ticker

use crate::catalog::{CatalogConfig, Symbol, BINANCE_API_URL};
use crate::controller::ControllerConfig;
use crate::feed::{BinanceFeed, BINANCE_WS_URL};
use crate::notify::{NotifierConfig, DEFAULT_NOTIFIER_PORT};
use crate::telemetry::LogFormat;
use serde::Deserialize;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogSection,
    #[serde(default)]
    pub feed: FeedSection,
    #[serde(default)]
    pub notifier: Option<NotifierSection>,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Symbol catalog configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSection {
    /// REST base URL
    #[serde(default = "default_api_url")]
    pub base_url: String,
    /// Settlement currency listed symbols must be quoted in
    #[serde(default = "default_quote_asset")]
    pub quote_asset: String,
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,
}

/// Price feed configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedSection {
    /// WebSocket base URL; the stream path is appended
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    /// Symbol selected on start
    #[serde(default = "default_symbol")]
    pub default_symbol: String,
    /// Commit period of the sampling tick
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub connect_timeout_secs: u64,
}

/// Device notifier configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NotifierSection {
    pub host: String,
    #[serde(default = "default_notifier_port")]
    pub port: u16,
    #[serde(default = "default_notifier_timeout_secs")]
    pub timeout_secs: u64,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Prometheus exporter port; disabled when absent
    pub metrics_port: Option<u16>,
}

fn default_api_url() -> String {
    BINANCE_API_URL.to_string()
}
fn default_quote_asset() -> String {
    "USDT".to_string()
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_ws_url() -> String {
    BINANCE_WS_URL.to_string()
}
fn default_symbol() -> String {
    "BTCUSDT".to_string()
}
fn default_sample_interval_ms() -> u64 {
    500
}
fn default_ping_interval_secs() -> u64 {
    30
}
fn default_notifier_port() -> u16 {
    DEFAULT_NOTIFIER_PORT
}
fn default_notifier_timeout_secs() -> u64 {
    5
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            quote_asset: default_quote_asset(),
            timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for FeedSection {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            default_symbol: default_symbol(),
            sample_interval_ms: default_sample_interval_ms(),
            ping_interval_secs: default_ping_interval_secs(),
            connect_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_port: None,
        }
    }
}

impl CatalogSection {
    pub fn client_config(&self) -> CatalogConfig {
        CatalogConfig {
            base_url: self.base_url.clone(),
            quote_asset: self.quote_asset.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

impl FeedSection {
    pub fn binance_feed(&self) -> BinanceFeed {
        BinanceFeed::with_base_url(self.ws_url.as_str())
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .ping_interval(Duration::from_secs(self.ping_interval_secs))
    }

    /// Controller settings; `symbol` overrides the configured default
    pub fn controller_config(&self, symbol: Option<&str>) -> anyhow::Result<ControllerConfig> {
        if self.sample_interval_ms == 0 {
            anyhow::bail!("feed.sample_interval_ms must be greater than zero");
        }

        let initial = Symbol::new(symbol.unwrap_or(&self.default_symbol));
        Ok(ControllerConfig {
            sample_interval: Duration::from_millis(self.sample_interval_ms),
            initial_symbol: (!initial.is_empty()).then_some(initial),
        })
    }
}

impl NotifierSection {
    pub fn notifier_config(&self) -> NotifierConfig {
        NotifierConfig {
            host: self.host.clone(),
            port: self.port,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: CatalogSection::default(),
            feed: FeedSection::default(),
            notifier: None,
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

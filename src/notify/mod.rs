//! Downstream device notifier
//!
//! Best-effort HTTP call telling an external display device which symbol is
//! selected. Its outcome is reported to the caller only and never feeds back
//! into the controller.

use crate::catalog::Symbol;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Default port the device service listens on
pub const DEFAULT_NOTIFIER_PORT: u16 = 5000;

/// Notifier errors
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Request could not be sent
    #[error("Device request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Device answered with a non-success status
    #[error("Device returned status {0}")]
    Status(reqwest::StatusCode),
}

/// Configuration for the device notifier
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Device host name or IP address
    pub host: String,
    /// Device port
    pub port: u16,
    /// Request timeout
    pub timeout: Duration,
}

impl NotifierConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_NOTIFIER_PORT,
            timeout: Duration::from_secs(5),
        }
    }
}

/// Sends symbol changes to the device
pub struct SymbolNotifier {
    config: NotifierConfig,
    client: Client,
}

impl SymbolNotifier {
    pub fn new(config: NotifierConfig) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!("http://{}:{}/start", self.config.host.trim(), self.config.port)
    }

    /// Tell the device to start showing `symbol`
    ///
    /// Returns the JSON body the device answered with, or `Null` if it
    /// answered with something else.
    pub async fn notify(&self, symbol: &Symbol) -> Result<serde_json::Value, NotifyError> {
        let url = self.endpoint();

        tracing::debug!(url = %url, symbol = %symbol, "Notifying device");

        let response = self
            .client
            .get(&url)
            .query(&[("coin", symbol.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifyError::Status(response.status()));
        }

        let body = response.text().await?;
        let ack = serde_json::from_str(&body).unwrap_or(serde_json::Value::Null);

        tracing::info!(symbol = %symbol, response = %ack, "Device acknowledged symbol");
        Ok(ack)
    }
}

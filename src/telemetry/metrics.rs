//! Prometheus metrics

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum FeedMetric {
    /// Raw feed message handed to the decoder
    MessageReceived,
    /// Feed message that failed to decode
    DecodeFailed,
    /// Sampled value committed on a tick
    Commit,
    /// Subscription reached streaming
    SubscriptionOpened,
    /// Subscription failed or broke
    TransportError,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Last committed price
    LastPrice,
    /// Number of selectable symbols
    CatalogSize,
}

impl FeedMetric {
    fn name(self) -> &'static str {
        match self {
            FeedMetric::MessageReceived => "ticker_feed_messages_total",
            FeedMetric::DecodeFailed => "ticker_feed_decode_failures_total",
            FeedMetric::Commit => "ticker_sample_commits_total",
            FeedMetric::SubscriptionOpened => "ticker_subscriptions_opened_total",
            FeedMetric::TransportError => "ticker_transport_errors_total",
        }
    }
}

impl GaugeMetric {
    fn name(self) -> &'static str {
        match self {
            GaugeMetric::LastPrice => "ticker_last_price",
            GaugeMetric::CatalogSize => "ticker_catalog_symbols",
        }
    }
}

/// Increment a counter
pub fn record(metric: FeedMetric) {
    metrics::counter!(metric.name()).increment(1);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    metrics::gauge!(metric.name()).set(value);
}

/// Serve `/metrics` on the given port
pub fn install_exporter(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}

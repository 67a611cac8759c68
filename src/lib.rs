//! price-ticker: live exchange price with sampled updates and direction
//!
//! This library provides:
//! - Symbol catalog loading from the Binance exchangeInfo endpoint
//! - Trade price subscriptions over the Binance WebSocket stream
//! - A streaming price controller that samples the feed on a fixed tick
//!   and derives an up/down signal from consecutive commits
//! - An optional best-effort notifier for an external display device
//! - Configuration, CLI and telemetry

pub mod catalog;
pub mod cli;
pub mod config;
pub mod controller;
pub mod feed;
pub mod notify;
pub mod telemetry;
pub mod ws;

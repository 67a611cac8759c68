//! Subscription state machine
//!
//! Pure, synchronous core of the controller. It owns the sampling buffer, the
//! committed pair, the catalog and the latest-error slot, and decides every
//! transition; the event loop in `runner` only performs the IO it asks for.
//!
//! Each subscription attempt gets a new generation number. Events carrying an
//! older generation, or arriving after shutdown, are dropped without effect.

use super::sampler::Sampler;
use super::types::{ControllerError, ControllerState, PriceSample, PriceView};
use crate::catalog::{CatalogError, Symbol};
use crate::feed::{parse_trade_message, FeedError};
use crate::telemetry::{record, set_gauge, FeedMetric, GaugeMetric};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Result of handling one raw feed message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Price decoded and buffered for the next tick
    Buffered,
    /// Message unreadable; error raised, subscription kept
    DecodeFailed,
    /// Stale generation, wrong state, or controller shut down
    Ignored,
}

/// Controller state machine
#[derive(Debug)]
pub struct ControllerMachine {
    state: ControllerState,
    symbol: Option<Symbol>,
    generation: u64,
    active: bool,
    sampler: Sampler<PriceSample>,
    catalog: Arc<Vec<Symbol>>,
    last_error: Option<ControllerError>,
    error_count: u64,
    commits: u64,
}

impl ControllerMachine {
    pub fn new() -> Self {
        Self {
            state: ControllerState::Idle,
            symbol: None,
            generation: 0,
            active: true,
            sampler: Sampler::new(),
            catalog: Arc::new(Vec::new()),
            last_error: None,
            error_count: 0,
            commits: 0,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn symbol(&self) -> Option<&Symbol> {
        self.symbol.as_ref()
    }

    /// False once shut down
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether a subscription is opening or open
    pub fn is_subscribed(&self) -> bool {
        matches!(
            self.state,
            ControllerState::Connecting | ControllerState::Streaming
        )
    }

    /// Snapshot for the presentation layer
    pub fn view(&self) -> PriceView {
        PriceView {
            symbol: self.symbol.clone(),
            state: self.state,
            current: self.sampler.current().copied(),
            previous: self.sampler.previous().copied(),
            catalog: Arc::clone(&self.catalog),
            last_error: self.last_error.clone(),
            error_count: self.error_count,
            commits: self.commits,
        }
    }

    fn transition(&mut self, to: ControllerState) {
        tracing::debug!(
            from = %self.state,
            to = %to,
            symbol = ?self.symbol.as_ref().map(Symbol::as_str),
            generation = self.generation,
            "Controller state transition"
        );
        self.state = to;
    }

    fn raise(&mut self, error: ControllerError) {
        tracing::warn!(kind = ?error.kind(), error = %error, "Controller error");
        self.error_count += 1;
        self.last_error = Some(error);
    }

    fn is_current(&self, generation: u64) -> bool {
        self.active && generation == self.generation
    }

    /// Start a subscription for `symbol`
    ///
    /// The caller must have released any live subscription before opening the
    /// one identified by the returned generation. Returns `None` after
    /// shutdown.
    pub fn select_symbol(&mut self, symbol: Symbol) -> Option<u64> {
        if !self.active {
            return None;
        }

        if self.is_subscribed() {
            self.transition(ControllerState::Closing);
        }

        self.generation += 1;
        self.symbol = Some(symbol);
        self.sampler.reset();
        self.transition(ControllerState::Connecting);
        Some(self.generation)
    }

    /// Feed for `generation` opened
    ///
    /// Returns false when the result is stale and the stream must be dropped.
    pub fn on_opened(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) || self.state != ControllerState::Connecting {
            tracing::debug!(generation, "Discarding stale subscription");
            return false;
        }

        record(FeedMetric::SubscriptionOpened);
        self.last_error = None;
        self.transition(ControllerState::Streaming);
        true
    }

    /// Feed for `generation` failed to open or broke while streaming
    ///
    /// Returns true when the live subscription has ended and its resources
    /// must be released.
    pub fn on_transport_error(&mut self, generation: u64, error: FeedError) -> bool {
        if !self.is_current(generation) || !self.is_subscribed() {
            return false;
        }

        record(FeedMetric::TransportError);
        let error = match error {
            FeedError::Transport(msg) | FeedError::Decode(msg) => {
                ControllerError::TransportError(msg)
            }
        };
        self.raise(error);
        // Committed pair stays on screen
        self.sampler.discard_pending();
        self.transition(ControllerState::Errored);
        self.transition(ControllerState::Idle);
        true
    }

    /// Raw message for `generation`
    pub fn on_message(
        &mut self,
        generation: u64,
        text: &str,
        received_at: DateTime<Utc>,
    ) -> MessageOutcome {
        if !self.is_current(generation) || self.state != ControllerState::Streaming {
            return MessageOutcome::Ignored;
        }

        record(FeedMetric::MessageReceived);
        match parse_trade_message(text) {
            Ok(update) => {
                self.sampler.offer(PriceSample {
                    price: update.price,
                    received_at,
                    trade_time: update.trade_time,
                });
                MessageOutcome::Buffered
            }
            Err(e) => {
                record(FeedMetric::DecodeFailed);
                self.raise(e.into());
                MessageOutcome::DecodeFailed
            }
        }
    }

    /// Sampling tick; returns true when a value was committed
    pub fn on_tick(&mut self) -> bool {
        if !self.active || !self.is_subscribed() {
            return false;
        }

        if !self.sampler.tick() {
            return false;
        }

        self.commits += 1;
        self.last_error = None;
        record(FeedMetric::Commit);
        if let Some(sample) = self.sampler.current() {
            set_gauge(GaugeMetric::LastPrice, sample.price);
        }
        true
    }

    /// One-shot catalog load finished
    ///
    /// On failure the previous catalog is kept.
    pub fn on_catalog(&mut self, result: Result<Vec<Symbol>, CatalogError>) -> bool {
        if !self.active {
            return false;
        }

        match result {
            Ok(symbols) => {
                tracing::info!(count = symbols.len(), "Symbol catalog ready");
                set_gauge(GaugeMetric::CatalogSize, symbols.len() as f64);
                self.catalog = Arc::new(symbols);
            }
            Err(e) => self.raise(e.into()),
        }
        true
    }

    /// Stop for good; every later event is ignored
    pub fn shutdown(&mut self) {
        if !self.active {
            return;
        }

        if self.is_subscribed() {
            self.transition(ControllerState::Closing);
        }
        self.transition(ControllerState::Idle);
        self.active = false;
    }
}

impl Default for ControllerMachine {
    fn default() -> Self {
        Self::new()
    }
}

//! Controller event loop
//!
//! One task owns the state machine and multiplexes every event source:
//! consumer commands, the catalog fetch, the pending subscription open, the
//! live feed stream and the sampling tick. Handlers run one at a time, so the
//! state needs no locking. Releasing a subscription means dropping its open
//! future or stream, which happens before the next one is created.

use super::machine::ControllerMachine;
use super::types::PriceView;
use crate::catalog::{CatalogError, Symbol, SymbolSource};
use crate::feed::{FeedError, FeedStream, PriceFeed};
use chrono::Utc;
use futures_util::future::BoxFuture;
use futures_util::StreamExt;
use std::future::pending;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};

type OpenFuture = BoxFuture<'static, (u64, Result<FeedStream, FeedError>)>;
type CatalogFuture = BoxFuture<'static, Result<Vec<Symbol>, CatalogError>>;

/// Consumer requests
#[derive(Debug)]
pub(super) enum Command {
    Select(Symbol),
    Shutdown,
}

/// The open subscription
struct LiveFeed {
    generation: u64,
    stream: FeedStream,
}

pub(super) struct Runner {
    machine: ControllerMachine,
    feed: Arc<dyn PriceFeed>,
    commands: mpsc::Receiver<Command>,
    view_tx: watch::Sender<PriceView>,
    sample_interval: Duration,
    catalog: Option<CatalogFuture>,
    pending: Option<OpenFuture>,
    live: Option<LiveFeed>,
    ticker: Option<Interval>,
}

impl Runner {
    pub(super) fn new(
        feed: Arc<dyn PriceFeed>,
        source: Arc<dyn SymbolSource>,
        commands: mpsc::Receiver<Command>,
        view_tx: watch::Sender<PriceView>,
        sample_interval: Duration,
    ) -> Self {
        let catalog: CatalogFuture = Box::pin(async move { source.load_symbols().await });

        Self {
            machine: ControllerMachine::new(),
            feed,
            commands,
            view_tx,
            sample_interval,
            catalog: Some(catalog),
            pending: None,
            live: None,
            ticker: None,
        }
    }

    pub(super) async fn run(mut self, initial_symbol: Option<Symbol>) {
        tracing::info!(
            sample_interval_ms = self.sample_interval.as_millis() as u64,
            "Price controller started"
        );

        if let Some(symbol) = initial_symbol {
            self.select(symbol);
            self.publish();
        }

        loop {
            tokio::select! {
                biased;

                cmd = self.commands.recv() => {
                    match cmd {
                        Some(Command::Select(symbol)) => self.select(symbol),
                        Some(Command::Shutdown) | None => break,
                    }
                }

                _ = next_tick(&mut self.ticker) => {
                    self.machine.on_tick();
                }

                result = next_catalog(&mut self.catalog) => {
                    self.catalog = None;
                    self.machine.on_catalog(result);
                }

                (generation, result) = next_open(&mut self.pending) => {
                    self.pending = None;
                    self.opened(generation, result);
                }

                (generation, item) = next_feed_item(&mut self.live) => {
                    self.feed_item(generation, item);
                }
            }

            self.publish();
        }

        self.shutdown();
    }

    fn select(&mut self, symbol: Symbol) {
        if symbol.is_empty() {
            tracing::warn!("Ignoring empty symbol selection");
            return;
        }

        // Close the old subscription before the new one exists
        self.release_subscription();

        let Some(generation) = self.machine.select_symbol(symbol.clone()) else {
            return;
        };

        tracing::info!(symbol = %symbol, generation, "Opening price subscription");

        let feed = Arc::clone(&self.feed);
        self.pending = Some(Box::pin(async move {
            let result = feed.open(&symbol).await;
            (generation, result)
        }));
        self.ticker = Some(sampling_interval(self.sample_interval));
    }

    fn opened(&mut self, generation: u64, result: Result<FeedStream, FeedError>) {
        match result {
            Ok(stream) => {
                if self.machine.on_opened(generation) {
                    self.live = Some(LiveFeed { generation, stream });
                }
            }
            Err(e) => {
                if self.machine.on_transport_error(generation, e) {
                    self.release_subscription();
                }
            }
        }
    }

    fn feed_item(&mut self, generation: u64, item: Option<Result<String, FeedError>>) {
        let ended = match item {
            Some(Ok(text)) => {
                self.machine.on_message(generation, &text, Utc::now());
                false
            }
            Some(Err(e)) => self.machine.on_transport_error(generation, e),
            None => self.machine.on_transport_error(
                generation,
                FeedError::Transport("feed stream ended".to_string()),
            ),
        };

        if ended {
            self.release_subscription();
        }
    }

    fn release_subscription(&mut self) {
        if let Some(live) = self.live.take() {
            tracing::debug!(generation = live.generation, "Closing price subscription");
        }
        self.pending = None;
        self.ticker = None;
    }

    fn publish(&self) {
        let view = self.machine.view();
        self.view_tx.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
    }

    fn shutdown(&mut self) {
        self.release_subscription();
        self.catalog = None;
        self.machine.shutdown();
        self.publish();
        tracing::info!("Price controller stopped");
    }
}

fn sampling_interval(period: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker.as_mut() {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending().await,
    }
}

async fn next_catalog(slot: &mut Option<CatalogFuture>) -> Result<Vec<Symbol>, CatalogError> {
    match slot.as_mut() {
        Some(fut) => fut.await,
        None => pending().await,
    }
}

async fn next_open(slot: &mut Option<OpenFuture>) -> (u64, Result<FeedStream, FeedError>) {
    match slot.as_mut() {
        Some(fut) => fut.await,
        None => pending().await,
    }
}

async fn next_feed_item(live: &mut Option<LiveFeed>) -> (u64, Option<Result<String, FeedError>>) {
    match live.as_mut() {
        Some(feed) => (feed.generation, feed.stream.next().await),
        None => pending().await,
    }
}

//! Streaming price controller
//!
//! Owns the subscription for the selected symbol, samples its trade prices on
//! a fixed tick and derives the up/down signal from consecutive commits. The
//! consumer drives it through [`PriceController`] and renders the
//! [`PriceView`] snapshots it publishes.

mod machine;
mod runner;
mod sampler;
mod types;

pub use machine::{ControllerMachine, MessageOutcome};
pub use sampler::{CommittedPair, LatestSlot, Sampler};
pub use types::{
    ControllerError, ControllerState, DirectionSignal, ErrorKind, PriceSample, PriceView,
};

use crate::catalog::{Symbol, SymbolSource};
use crate::feed::PriceFeed;
use runner::{Command, Runner};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Default commit period
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

/// Controller configuration
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Period of the sampling tick
    pub sample_interval: Duration,
    /// Symbol to subscribe to on start
    pub initial_symbol: Option<Symbol>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            initial_symbol: None,
        }
    }
}

/// Handle to a running price controller
///
/// Dropping the handle stops the controller as if `shutdown` had been called.
pub struct PriceController {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<PriceView>,
    task: JoinHandle<()>,
}

impl PriceController {
    /// Start the controller task
    ///
    /// The catalog is loaded once, right away. If `config.initial_symbol` is
    /// set, its subscription opens immediately as well.
    pub fn spawn(
        feed: Arc<dyn PriceFeed>,
        source: Arc<dyn SymbolSource>,
        config: ControllerConfig,
    ) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel(64);
        let (view_tx, view_rx) = watch::channel(PriceView::default());

        let runner = Runner::new(feed, source, commands_rx, view_tx, config.sample_interval);
        let task = tokio::spawn(runner.run(config.initial_symbol));

        Self {
            commands: commands_tx,
            view: view_rx,
            task,
        }
    }

    /// Switch the subscription to `symbol`
    ///
    /// Re-selecting the current symbol reopens its subscription.
    pub async fn select_symbol(&self, symbol: impl Into<Symbol>) -> anyhow::Result<()> {
        self.commands
            .send(Command::Select(symbol.into()))
            .await
            .map_err(|_| anyhow::anyhow!("Price controller has stopped"))
    }

    /// Latest published snapshot
    pub fn view(&self) -> PriceView {
        self.view.borrow().clone()
    }

    /// Receiver notified on every published change
    pub fn subscribe(&self) -> watch::Receiver<PriceView> {
        self.view.clone()
    }

    /// Stop the controller and wait for it to release its subscription
    pub async fn shutdown(self) -> anyhow::Result<()> {
        // The task may already be gone; joining below still succeeds
        let _ = self.commands.send(Command::Shutdown).await;
        self.task.await?;
        Ok(())
    }
}

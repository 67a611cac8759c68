//! Watch command implementation
//!
//! Terminal presentation for the price controller: one line per commit,
//! error lines when a new error is raised, and stdin-driven reselection.

use crate::catalog::{CatalogClient, Symbol};
use crate::config::Config;
use crate::controller::{ControllerState, PriceController, PriceView};
use crate::notify::SymbolNotifier;
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Symbol to subscribe to on start (defaults to feed.default_symbol)
    #[arg(short, long)]
    pub symbol: Option<String>,

    /// Device host to notify on symbol changes (overrides [notifier].host)
    #[arg(long)]
    pub device: Option<String>,
}

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Select(Symbol),
    List,
    Quit,
    Empty,
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line.to_ascii_lowercase().as_str() {
            "" => Input::Empty,
            "quit" | "exit" | "q" => Input::Quit,
            "list" | "ls" => Input::List,
            _ => Input::Select(Symbol::new(line.to_ascii_uppercase())),
        }
    }
}

/// Render the committed price of `view`
///
/// The settlement currency is stripped from the symbol for the label, so
/// `BTCUSDT` prints as `BTC`.
pub fn format_price_line(view: &PriceView, quote_asset: &str) -> Option<String> {
    let current = view.current?;
    let symbol = view.symbol.as_ref()?;
    let label = symbol
        .as_str()
        .strip_suffix(quote_asset)
        .filter(|base| !base.is_empty())
        .unwrap_or(symbol.as_str());

    let line = format!("{:<10} ${:.2} {}", label, current.price, view.direction().glyph());
    Some(line.trim_end().to_string())
}

/// Tracks what has already been printed
#[derive(Debug, Default)]
struct Renderer {
    commits: u64,
    errors: u64,
    state: Option<ControllerState>,
    symbol: Option<Symbol>,
}

impl Renderer {
    fn render(&mut self, view: &PriceView, quote_asset: &str) {
        if self.state != Some(view.state) || self.symbol != view.symbol {
            if let Some(symbol) = &view.symbol {
                eprintln!("[{}] {}", symbol, view.state);
            }
            self.state = Some(view.state);
            self.symbol = view.symbol.clone();
        }

        if view.error_count != self.errors {
            self.errors = view.error_count;
            if let Some(error) = &view.last_error {
                eprintln!("error: {}", error);
            }
        }

        if view.commits != self.commits {
            self.commits = view.commits;
            if let Some(line) = format_price_line(view, quote_asset) {
                println!("{}", line);
            }
        }
    }
}

impl WatchArgs {
    fn notifier(&self, config: &Config) -> anyhow::Result<Option<Arc<SymbolNotifier>>> {
        let notifier_config = match (&self.device, &config.notifier) {
            (Some(host), Some(section)) => {
                let mut nc = section.notifier_config();
                nc.host = host.clone();
                nc
            }
            (Some(host), None) => crate::notify::NotifierConfig::new(host.as_str()),
            (None, Some(section)) => section.notifier_config(),
            (None, None) => return Ok(None),
        };
        Ok(Some(Arc::new(SymbolNotifier::new(notifier_config)?)))
    }

    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let controller_config = config.feed.controller_config(self.symbol.as_deref())?;
        let source = Arc::new(CatalogClient::with_config(config.catalog.client_config())?);
        let feed = Arc::new(config.feed.binance_feed());
        let notifier = self.notifier(config)?;
        let quote_asset = config.catalog.quote_asset.as_str();

        if let (Some(notifier), Some(symbol)) = (&notifier, &controller_config.initial_symbol) {
            spawn_notify(Arc::clone(notifier), symbol.clone());
        }

        let controller = PriceController::spawn(feed, source, controller_config);
        let mut views = controller.subscribe();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut renderer = Renderer::default();

        eprintln!("Type a symbol to switch, `list` to show symbols, `quit` to exit");

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                changed = views.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let view = views.borrow_and_update().clone();
                    renderer.render(&view, quote_asset);
                }

                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    match Input::parse(&line) {
                        Input::Empty => {}
                        Input::Quit => break,
                        Input::List => {
                            let view = controller.view();
                            if view.catalog.is_empty() {
                                eprintln!("Symbol list not loaded");
                            }
                            for symbol in view.catalog.iter() {
                                println!("{}", symbol);
                            }
                        }
                        Input::Select(symbol) => {
                            let view = controller.view();
                            if !view.catalog.is_empty() && !view.is_listed(&symbol) {
                                tracing::warn!(symbol = %symbol, "Symbol is not in the catalog");
                            }
                            controller.select_symbol(symbol.clone()).await?;
                            if let Some(notifier) = &notifier {
                                spawn_notify(Arc::clone(notifier), symbol);
                            }
                        }
                    }
                }

                _ = &mut ctrl_c => {
                    tracing::info!("Interrupted");
                    break;
                }
            }
        }

        tokio::time::timeout(Duration::from_secs(5), controller.shutdown()).await??;
        Ok(())
    }
}

/// Fire-and-forget device notification; failures are only reported
fn spawn_notify(notifier: Arc<SymbolNotifier>, symbol: Symbol) {
    tokio::spawn(async move {
        if let Err(e) = notifier.notify(&symbol).await {
            tracing::warn!(symbol = %symbol, error = %e, "Device notification failed");
            eprintln!("device: {}", e);
        }
    });
}

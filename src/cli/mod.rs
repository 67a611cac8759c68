//! CLI interface for price-ticker
//!
//! Provides subcommands for:
//! - `watch`: Stream a live, sampled price for a symbol
//! - `symbols`: List the tradeable symbols
//! - `config`: Show the effective configuration

mod symbols;
mod watch;

pub use symbols::SymbolsArgs;
pub use watch::{format_price_line, Input, WatchArgs};

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "price-ticker")]
#[command(about = "Live exchange price ticker with up/down direction")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream a live price; type a symbol on stdin to switch
    Watch(WatchArgs),
    /// List tradeable symbols
    Symbols(SymbolsArgs),
    /// Show effective configuration
    Config,
}

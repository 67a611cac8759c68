use clap::Parser;
use price_ticker::cli::{Cli, Commands};
use price_ticker::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
            eprintln!("Using default configuration");
            toml::from_str(include_str!("../config.toml.example"))?
        }
    };

    // Initialize telemetry
    price_ticker::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Watch(args) => {
            tracing::info!("Starting price watch");
            args.execute(&config).await?;
        }
        Commands::Symbols(args) => {
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!(
                "  Catalog: {} (quote {})",
                config.catalog.base_url, config.catalog.quote_asset
            );
            println!(
                "  Feed: {} default={} sample={}ms",
                config.feed.ws_url, config.feed.default_symbol, config.feed.sample_interval_ms
            );
            match &config.notifier {
                Some(n) => println!("  Notifier: {}:{}", n.host, n.port),
                None => println!("  Notifier: disabled"),
            }
            println!(
                "  Telemetry: level={} format={:?} metrics={:?}",
                config.telemetry.log_level, config.telemetry.log_format, config.telemetry.metrics_port
            );
        }
    }

    Ok(())
}

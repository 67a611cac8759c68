//! Symbols command implementation

use crate::catalog::CatalogClient;
use crate::config::Config;
use clap::Args;

#[derive(Args, Debug)]
pub struct SymbolsArgs {
    /// Settlement currency (overrides catalog.quote_asset)
    #[arg(long)]
    pub quote: Option<String>,

    /// Print as a JSON array
    #[arg(long)]
    pub json: bool,
}

impl SymbolsArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let mut client_config = config.catalog.client_config();
        if let Some(quote) = &self.quote {
            client_config.quote_asset = quote.trim().to_uppercase();
        }

        let client = CatalogClient::with_config(client_config)?;
        let symbols = client.fetch_symbols().await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&symbols)?);
        } else {
            for symbol in &symbols {
                println!("{}", symbol);
            }
            tracing::info!(
                count = symbols.len(),
                quote_asset = client.quote_asset(),
                "Listed symbols"
            );
        }

        Ok(())
    }
}

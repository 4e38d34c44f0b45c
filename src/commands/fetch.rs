//! One-shot fetch command.

use crate::config::Config;
use crate::eshop::{EshopApi, EshopClient, Fetcher};
use crate::format::Formatter;
use anyhow::{Context, Result};
use tracing::{debug, info};

/// Fetches the wishlist games currently on sale once.
pub struct FetchCommand {
    config: Config,
}

impl FetchCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Executes the fetch and returns formatted output.
    pub async fn execute(&self) -> Result<String> {
        let client = EshopClient::new(&self.config).context("Failed to create HTTP client")?;
        self.execute_with_client(client).await
    }

    /// Executes the fetch with a provided client (for testing).
    pub async fn execute_with_client<C: EshopApi>(&self, client: C) -> Result<String> {
        let wishlist = self.config.validate()?;
        debug!("{}", wishlist.description());

        let fetcher = Fetcher::new(self.config.country, wishlist, client)
            .with_page_delay(self.config.delay_ms, self.config.delay_jitter_ms);
        let results = fetcher
            .fetch_on_sale()
            .await
            .with_context(|| format!("Failed to fetch sales for {}", self.config.country))?;

        info!("{} wishlist games on sale", results.len());
        Ok(Formatter::new(self.config.format).format_results(&results))
    }
}

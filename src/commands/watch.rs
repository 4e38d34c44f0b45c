//! Watch command: refresh on an interval until interrupted.

use crate::config::Config;
use crate::coordinator::{term_statuses, Coordinator};
use crate::eshop::{EshopApi, EshopClient, Fetcher};
use crate::format::Formatter;
use anyhow::{Context, Result};
use std::future::Future;
use tracing::info;

/// Runs the coordinator and prints a per-entry summary after every refresh.
pub struct WatchCommand {
    config: Config,
}

impl WatchCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Watches until Ctrl-C, printing to stdout.
    pub async fn execute(&self) -> Result<()> {
        let client = EshopClient::new(&self.config).context("Failed to create HTTP client")?;
        let shutdown = async {
            if tokio::signal::ctrl_c().await.is_err() {
                // Without a signal handler, never stop on our own.
                std::future::pending::<()>().await;
            }
            info!("Received Ctrl-C, shutting down");
        };

        self.execute_with_client(client, shutdown, |summary| println!("{}\n", summary)).await
    }

    /// Watches with a provided client, shutdown signal and output sink (for testing).
    pub async fn execute_with_client<C, S, O>(&self, client: C, shutdown: S, output: O) -> Result<()>
    where
        C: EshopApi,
        S: Future<Output = ()>,
        O: Fn(String) + Send + Sync + 'static,
    {
        let wishlist = self.config.validate()?;
        let formatter = Formatter::new(self.config.format);

        let fetcher = Fetcher::new(self.config.country, wishlist.clone(), client)
            .with_page_delay(self.config.delay_ms, self.config.delay_jitter_ms);
        let coordinator = Coordinator::new(fetcher, self.config.scan_interval());

        coordinator.add_listener(move |results| {
            output(formatter.format_statuses(&term_statuses(&wishlist, results)));
        });

        coordinator.run(shutdown).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::eshop::models::{IndexQuery, MultiQueryResponse};
    use crate::eshop::Region;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct MockEshopClient;

    #[async_trait]
    impl EshopApi for MockEshopClient {
        async fn multiple_queries(&self, _queries: Vec<IndexQuery>) -> Result<MultiQueryResponse> {
            Ok(serde_json::from_value(serde_json::json!({
                "results": [{
                    "hits": [{"title": "Aggelos", "nsuid": "1", "msrp": 14.99, "salePrice": 8.24}],
                    "nbPages": 1
                }]
            }))?)
        }

        async fn get(&self, url: &str) -> Result<String> {
            anyhow::bail!("unexpected GET {}", url)
        }
    }

    fn make_test_config() -> Config {
        Config {
            country: Region::Us,
            wishlist: vec!["Aggelos".to_string(), "Carrion".to_string()],
            scan_interval_secs: 600,
            format: OutputFormat::Table,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_watch_prints_summary() {
        let printed = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&printed);

        WatchCommand::new(make_test_config())
            .execute_with_client(
                MockEshopClient,
                tokio::time::sleep(Duration::from_millis(100)),
                move |summary| sink.lock().unwrap().push(summary),
            )
            .await
            .unwrap();

        let printed = printed.lock().unwrap();
        // Only the immediate refresh fits before shutdown.
        assert_eq!(printed.len(), 1);
        assert!(printed[0].contains("1 of 2 wishlist entries on sale"));
        assert!(printed[0].contains("Carrion: not on sale"));
    }

    #[tokio::test]
    async fn test_watch_rejects_empty_wishlist() {
        let config = Config { wishlist: Vec::new(), ..make_test_config() };
        let result = WatchCommand::new(config)
            .execute_with_client(MockEshopClient, async {}, |_| {})
            .await;
        assert!(result.is_err());
    }
}

//! HTTP client for the eShop search and price APIs.

use crate::config::Config;
use crate::eshop::models::{IndexQuery, MultiQueryRequest, MultiQueryResponse};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};
use wreq::Client;

/// Public search-only credentials used by nintendo.com.
pub const DEFAULT_ALGOLIA_APP_ID: &str = "U3B6GR4UA3";
pub const DEFAULT_ALGOLIA_API_KEY: &str = "c4da8be7fd29f0f5bfa42920b0a99dc7";

pub const EU_SEARCH_BASE: &str = "https://searching.nintendo-europe.com";
pub const EU_PRICE_BASE: &str = "https://api.ec.nintendo.com";

/// Upstream operations the fetcher needs - enables mocking for tests.
#[async_trait]
pub trait EshopApi: Send + Sync {
    /// Runs a batch of search-index queries.
    async fn multiple_queries(&self, queries: Vec<IndexQuery>) -> Result<MultiQueryResponse>;

    /// Performs a GET and returns the body, whatever its declared content type.
    async fn get(&self, url: &str) -> Result<String>;

    /// Base URL of the European search endpoint.
    fn search_base(&self) -> &str {
        EU_SEARCH_BASE
    }

    /// Base URL of the price lookup endpoint.
    fn price_base(&self) -> &str {
        EU_PRICE_BASE
    }
}

/// Base URLs for every upstream, overridable for tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub index_search: String,
    pub geo_search: String,
    pub price: String,
}

impl Endpoints {
    /// Production endpoints for the given search application.
    pub fn production(app_id: &str) -> Self {
        Self {
            index_search: format!("https://{}-dsn.algolia.net", app_id.to_lowercase()),
            geo_search: EU_SEARCH_BASE.to_string(),
            price: EU_PRICE_BASE.to_string(),
        }
    }

    /// Points every upstream at one server (used with a mock server).
    pub fn all(base_url: impl Into<String>) -> Self {
        let base = base_url.into();
        Self { index_search: base.clone(), geo_search: base.clone(), price: base }
    }
}

/// eShop HTTP client.
pub struct EshopClient {
    client: Client,
    endpoints: Endpoints,
    app_id: String,
    api_key: String,
}

impl EshopClient {
    /// Creates a new client against the production endpoints.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_endpoints(config, Endpoints::production(&config.algolia_app_id))
    }

    /// Creates a new client with custom endpoints (for testing).
    pub fn with_endpoints(config: &Config, endpoints: Endpoints) -> Result<Self> {
        let mut builder = Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoints,
            app_id: config.algolia_app_id.clone(),
            api_key: config.algolia_api_key.clone(),
        })
    }

    /// Returns the configured endpoints.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    async fn read_body(response: wreq::Response, url: &str) -> Result<String> {
        let status = response.status();
        debug!("Response status: {}", status);

        if status == 429 {
            warn!("Rate limited (429) by {}", url);
            anyhow::bail!("Rate limited by the eShop API. Try a longer scan interval.");
        }

        if !status.is_success() {
            anyhow::bail!("Request to {} failed with status: {}", url, status);
        }

        response.text().await.context("Failed to read response body")
    }
}

#[async_trait]
impl EshopApi for EshopClient {
    async fn multiple_queries(&self, queries: Vec<IndexQuery>) -> Result<MultiQueryResponse> {
        let url = format!("{}/1/indexes/*/queries", self.endpoints.index_search);
        let body = serde_json::to_string(&MultiQueryRequest { requests: queries })
            .context("Failed to encode search queries")?;

        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .header("X-Algolia-Application-Id", self.app_id.as_str())
            .header("X-Algolia-API-Key", self.api_key.as_str())
            .body(body)
            .send()
            .await
            .context("Failed to send search request")?;

        let text = Self::read_body(response, &url).await?;
        serde_json::from_str(&text).context("Failed to decode search response")
    }

    async fn get(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json, text/plain, */*")
            .send()
            .await
            .context("Failed to send request")?;

        Self::read_body(response, url).await
    }

    fn search_base(&self) -> &str {
        &self.endpoints.geo_search
    }

    fn price_base(&self) -> &str {
        &self.endpoints.price
    }
}

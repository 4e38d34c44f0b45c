//! Fetches every discounted game for a country and keeps the wishlist matches.
//!
//! North America is served by a paginated facet index that reports its page
//! count; every other country uses a search endpoint that only reports a
//! record count, plus a separate price lookup. The backend is chosen once,
//! when the [`Fetcher`] is built.

use crate::eshop::client::EshopApi;
use crate::eshop::models::{
    EshopResults, GeoSearchResponse, IndexQuery, ItemPricing, PriceResponse, SwitchGame,
};
use crate::eshop::normalize::{
    normalize_geo_doc, normalize_index_hit, normalize_price_entry, NormalizeError,
};
use crate::eshop::regions::{Region, RegionClass};
use crate::filters::{Titled, Wishlist};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Hits per page requested from the facet index.
const INDEX_HITS_PER_PAGE: u32 = 350;
const INDEX_FACETS: &str = r#"["generalFilters","platform","availability","genres","howToShop","virtualConsole","franchises","priceRange","esrbRating","playerFilters"]"#;
const INDEX_FACET_FILTERS: &str = r#"[["platform:Nintendo Switch"],["generalFilters:Deals"]]"#;

/// Rows per page on the geo-search endpoint. Fixed by the upstream.
pub const GEO_PAGE_SIZE: u64 = 500;
const GEO_FILTER: &str = r#"type:GAME AND ((playable_on_txt:"HAC") AND (price_has_discount_b:"true")) AND sorting_title:* AND *:*"#;
const GEO_SORT: &str = "price_discount_percentage_f desc, price_lowest_f desc";
const GEO_BOOST: &str = "linear(ms(priority,NOW/HOUR),1.1e-11,0)";

/// Matches from one page plus the page count the upstream reported.
#[derive(Debug, Default)]
struct PageResult {
    games: EshopResults,
    num_pages: u64,
}

/// Backend-specific fetch logic, fixed per [`Fetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
enum FetchStrategy {
    IndexSearch(IndexSearch),
    GeoSearch(GeoSearch),
}

impl FetchStrategy {
    fn for_region(region: Region) -> Self {
        match region.class() {
            RegionClass::IndexSearch { index_name } => {
                FetchStrategy::IndexSearch(IndexSearch { index_name })
            }
            RegionClass::GeoSearch { language } => {
                FetchStrategy::GeoSearch(GeoSearch { country: region, language })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct IndexSearch {
    index_name: &'static str,
}

impl IndexSearch {
    /// Builds the query for one page. A new value per request; nothing is shared.
    fn query(&self, page: u64) -> IndexQuery {
        let params = format!(
            "query=&hitsPerPage={}&maxValuesPerFacet=30&analytics=false&facets={}&tagFilters=&facetFilters={}&page={}",
            INDEX_HITS_PER_PAGE,
            urlencoding::encode(INDEX_FACETS),
            urlencoding::encode(INDEX_FACET_FILTERS),
            page
        );
        IndexQuery { index_name: self.index_name.to_string(), params }
    }

    async fn page(
        &self,
        client: &impl EshopApi,
        wishlist: &Wishlist,
        page: u64,
    ) -> Result<PageResult> {
        let response = client
            .multiple_queries(vec![self.query(page)])
            .await
            .with_context(|| format!("Failed to fetch {} page {}", self.index_name, page))?;

        let results = response
            .results
            .into_iter()
            .next()
            .with_context(|| format!("Search response for page {} had no results", page))?;

        let mut games = EshopResults::new();
        collect_matches(wishlist, &results.hits, normalize_index_hit, &mut games)
            .with_context(|| format!("Failed to normalize {} page {}", self.index_name, page))?;

        Ok(PageResult { games, num_pages: u64::from(results.nb_pages) })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct GeoSearch {
    country: Region,
    language: &'static str,
}

impl GeoSearch {
    fn search_url(&self, base: &str, page: u64) -> String {
        format!(
            "{}/{}/select?q=*&fq={}&sort={}&start={}&rows={}&wt=json&bf={}",
            base.trim_end_matches('/'),
            self.language,
            urlencoding::encode(GEO_FILTER),
            urlencoding::encode(GEO_SORT),
            page * GEO_PAGE_SIZE,
            GEO_PAGE_SIZE,
            urlencoding::encode(GEO_BOOST)
        )
    }

    fn price_url(&self, base: &str, nsuids: &[u64]) -> String {
        let ids: Vec<String> = nsuids.iter().map(u64::to_string).collect();
        format!(
            "{}/v1/price?country={}&ids={}&lang=en",
            base.trim_end_matches('/'),
            self.country.code(),
            urlencoding::encode(&ids.join(","))
        )
    }

    async fn page(
        &self,
        client: &impl EshopApi,
        wishlist: &Wishlist,
        page: u64,
    ) -> Result<PageResult> {
        let url = self.search_url(client.search_base(), page);
        let body = client
            .get(&url)
            .await
            .with_context(|| format!("Failed to fetch {} page {}", self.country, page))?;

        // Served as text/html; parse as JSON regardless.
        let data: GeoSearchResponse = serde_json::from_str(&body)
            .with_context(|| format!("Failed to decode {} page {}", self.country, page))?;

        let mut games = EshopResults::new();
        collect_matches(wishlist, &data.response.docs, normalize_geo_doc, &mut games)
            .with_context(|| format!("Failed to normalize {} page {}", self.country, page))?;

        Ok(PageResult { games, num_pages: data.response.num_found.div_ceil(GEO_PAGE_SIZE) })
    }

    async fn pricing(
        &self,
        client: &impl EshopApi,
        nsuids: &[u64],
    ) -> Result<HashMap<u64, ItemPricing>> {
        let url = self.price_url(client.price_base(), nsuids);
        let body = client.get(&url).await.context("Failed to fetch prices")?;
        let response: PriceResponse =
            serde_json::from_str(&body).context("Failed to decode price response")?;

        let mut pricing = HashMap::with_capacity(response.prices.len());
        for entry in response.prices {
            let (nsuid, item) = normalize_price_entry(entry).context("Failed to read price entry")?;
            pricing.insert(nsuid, item);
        }
        Ok(pricing)
    }
}

/// Copies looked-up prices onto collected games. Prices for games that were
/// not collected are dropped.
fn merge_pricing(games: &mut EshopResults, pricing: HashMap<u64, ItemPricing>) {
    for (nsuid, item) in pricing {
        match games.get_mut(&nsuid) {
            Some(game) => {
                game.normal_price = Some(item.normal_price);
                game.sale_price = Some(item.sale_price);
            }
            None => warn!("Price lookup returned unrequested nsuid {}", nsuid),
        }
    }
}

/// Filters raw records by title, normalizes the matches and inserts them.
/// Later inserts replace earlier ones with the same nsuid.
fn collect_matches<T: Titled>(
    wishlist: &Wishlist,
    records: &[T],
    normalize: fn(&T) -> Result<SwitchGame, NormalizeError>,
    into: &mut EshopResults,
) -> Result<usize, NormalizeError> {
    let mut matched = 0;
    for record in wishlist.retain(records) {
        let game = normalize(record)?;
        debug!("Wishlist match: {} ({})", game.title, game.nsuid);
        into.insert(game.nsuid, game);
        matched += 1;
    }
    Ok(matched)
}

/// Fetches sale data for one country and wishlist.
pub struct Fetcher<C> {
    client: C,
    region: Region,
    wishlist: Wishlist,
    strategy: FetchStrategy,
    delay_ms: u64,
    delay_jitter_ms: u64,
}

impl<C: EshopApi> Fetcher<C> {
    /// Creates a fetcher; the backend is picked from the region here.
    pub fn new(region: Region, wishlist: Wishlist, client: C) -> Self {
        Self {
            client,
            region,
            wishlist,
            strategy: FetchStrategy::for_region(region),
            delay_ms: 0,
            delay_jitter_ms: 0,
        }
    }

    /// Pauses between page requests.
    pub fn with_page_delay(mut self, delay_ms: u64, jitter_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self.delay_jitter_ms = jitter_ms;
        self
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn wishlist(&self) -> &Wishlist {
        &self.wishlist
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Fetches every discounted game matching the wishlist, keyed by nsuid.
    ///
    /// Either every page succeeds or the whole call fails.
    pub async fn fetch_on_sale(&self) -> Result<EshopResults> {
        info!("Fetching {} sales for {} wishlist terms", self.region, self.wishlist.len());

        let games = match &self.strategy {
            FetchStrategy::IndexSearch(index) => self.fetch_index(index).await?,
            FetchStrategy::GeoSearch(geo) => self.fetch_geo(geo).await?,
        };

        info!("Found {} wishlist games on sale in {}", games.len(), self.region);
        Ok(games)
    }

    async fn fetch_index(&self, index: &IndexSearch) -> Result<EshopResults> {
        let first = index.page(&self.client, &self.wishlist, 0).await?;
        let num_pages = first.num_pages;
        let mut games = first.games;
        debug!("{} reports {} pages", index.index_name, num_pages);

        for page in 1..num_pages {
            self.delay().await;
            let result = index.page(&self.client, &self.wishlist, page).await?;
            games.extend(result.games);
        }

        Ok(games)
    }

    async fn fetch_geo(&self, geo: &GeoSearch) -> Result<EshopResults> {
        let first = geo.page(&self.client, &self.wishlist, 0).await?;
        let num_pages = first.num_pages;
        let mut games = first.games;
        debug!("{} search reports {} pages", geo.country, num_pages);

        for page in 1..num_pages {
            self.delay().await;
            let result = geo.page(&self.client, &self.wishlist, page).await?;
            games.extend(result.games);
        }

        if games.is_empty() {
            debug!("No matches, skipping price lookup");
            return Ok(games);
        }

        let nsuids: Vec<u64> = games.keys().copied().collect();
        let pricing = geo.pricing(&self.client, &nsuids).await?;
        merge_pricing(&mut games, pricing);

        Ok(games)
    }

    async fn delay(&self) {
        if self.delay_ms == 0 && self.delay_jitter_ms == 0 {
            return;
        }

        let jitter =
            if self.delay_jitter_ms > 0 { rand::random_range(0..=self.delay_jitter_ms) } else { 0 };

        let total_delay = self.delay_ms + jitter;
        debug!("Delaying {}ms", total_delay);
        tokio::time::sleep(Duration::from_millis(total_delay)).await;
    }
}

/// One-shot fetch for a country, wishlist and client.
pub async fn fetch<C: EshopApi>(
    region: Region,
    wishlist: Wishlist,
    client: C,
) -> Result<EshopResults> {
    Fetcher::new(region, wishlist, client).fetch_on_sale().await
}

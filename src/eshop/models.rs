//! Data models for eShop sale items and the raw upstream payloads.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Shown when an item has no usable box art.
pub const NO_BOX_ART_URL: &str = "https://raw.githubusercontent.com/custom-components/sensor.nintendo_wishlist/master/assets/no-box-art.png";

/// Items on sale keyed by nsuid.
pub type EshopResults = BTreeMap<u64, SwitchGame>;

/// A discounted game, normalized from either upstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwitchGame {
    /// eShop numeric identifier
    pub nsuid: u64,
    /// Game title as listed by the store
    pub title: String,
    /// Box art URL, or [`NO_BOX_ART_URL`]
    pub box_art_url: String,
    /// Price before the discount
    pub normal_price: Option<Price>,
    /// Discounted price
    pub sale_price: Option<Price>,
    /// Discount in whole percent (0-100)
    pub percent_off: u8,
}

/// A price as reported by one of the upstreams.
///
/// North American prices arrive as numbers and are rendered as `"$X"`; the
/// European price API returns amounts that are kept as-is.
#[derive(Debug, Clone, PartialEq)]
pub enum Price {
    Formatted(String),
    Amount(f64),
    /// The price API omitted this price.
    Unknown,
}

impl Price {
    /// Formats a North American dollar amount.
    pub fn dollars(amount: f64) -> Self {
        Price::Formatted(format!("${}", amount))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Price::Formatted(s) => write!(f, "{}", s),
            Price::Amount(v) => write!(f, "{}", v),
            Price::Unknown => write!(f, "?"),
        }
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Price::Formatted(s) => serializer.serialize_str(s),
            Price::Amount(v) => serializer.serialize_f64(*v),
            Price::Unknown => serializer.serialize_str("?"),
        }
    }
}

/// A number that some payloads send as a JSON string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    Number(serde_json::Number),
    Text(String),
}

impl NumberOrString {
    /// Interprets the value as an unsigned identifier.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            NumberOrString::Number(n) => n.as_u64(),
            NumberOrString::Text(s) => s.trim().parse().ok(),
        }
    }
}

// Index search (North America)

/// Request body for the multi-query endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiQueryRequest {
    pub requests: Vec<IndexQuery>,
}

/// One query against a named index.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexQuery {
    pub index_name: String,
    pub params: String,
}

/// Response envelope of the multi-query endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct MultiQueryResponse {
    pub results: Vec<IndexPage>,
}

/// One page of hits for one query.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexPage {
    #[serde(default)]
    pub hits: Vec<IndexHit>,
    #[serde(default = "default_page_count")]
    pub nb_pages: u32,
}

fn default_page_count() -> u32 {
    1
}

/// A raw search-index hit. Everything but the title is optional here so that
/// missing fields surface as normalization errors rather than decode errors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexHit {
    pub title: String,
    pub nsuid: Option<NumberOrString>,
    pub msrp: Option<f64>,
    pub sale_price: Option<f64>,
    pub boxart: Option<String>,
    pub gallery: Option<String>,
}

// Geo search (Europe and the rest)

/// Response envelope of the European search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GeoSearchResponse {
    pub response: GeoSearchBody,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoSearchBody {
    pub num_found: u64,
    #[serde(default)]
    pub docs: Vec<GeoDoc>,
}

/// A raw geo-search document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeoDoc {
    pub title: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub nsuid_txt: Vec<String>,
    pub price_discount_percentage_f: Option<f64>,
}

/// Response of the price lookup endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceResponse {
    #[serde(default)]
    pub prices: Vec<PriceEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceEntry {
    pub title_id: Option<NumberOrString>,
    pub regular_price: Option<PriceAmount>,
    pub discount_price: Option<PriceAmount>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceAmount {
    pub amount: Option<AmountValue>,
}

/// Price amounts are numbers in some payloads and strings in others.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AmountValue {
    Number(f64),
    Text(String),
}

impl From<AmountValue> for Price {
    fn from(value: AmountValue) -> Self {
        match value {
            AmountValue::Number(v) => Price::Amount(v),
            AmountValue::Text(s) => Price::Formatted(s),
        }
    }
}

/// Normal and sale price for one item, as returned by the price lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemPricing {
    pub normal_price: Price,
    pub sale_price: Price,
}

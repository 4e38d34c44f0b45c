//! Conversion from raw upstream records to [`SwitchGame`].
//!
//! Required fields that are missing or unparseable produce a
//! [`NormalizeError`]; box art and discount prices degrade to placeholders.

use crate::eshop::models::{
    GeoDoc, IndexHit, ItemPricing, Price, PriceEntry, SwitchGame, NO_BOX_ART_URL,
};
use thiserror::Error;
use tracing::trace;

/// File extensions accepted as box art.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "avif"];

/// A raw record could not be turned into a [`SwitchGame`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizeError {
    #[error("record \"{title}\" is missing required field `{field}`")]
    MissingField { title: String, field: &'static str },

    #[error("record \"{title}\" has invalid `{field}`: {value}")]
    InvalidField { title: String, field: &'static str, value: String },
}

/// Returns the discount in whole percent, rounding the sale ratio up.
///
/// `percent_off(14.99, 8.24) == 45`. Non-positive or non-finite prices yield 0.
pub fn percent_off(original_price: f64, sale_price: f64) -> u8 {
    if !(original_price > 0.0) || !sale_price.is_finite() || sale_price < 0.0 {
        return 0;
    }
    let kept = (100.0 / (original_price / sale_price)).ceil();
    (100.0 - kept).clamp(0.0, 100.0) as u8
}

/// Rewrites protocol-relative URLs (`//host/path`) to `https://host/path`.
pub fn absolute_url(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{}", url)
    } else {
        url.to_string()
    }
}

/// Returns true if the URL path ends in a known image extension.
pub fn has_image_extension(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file = path.rsplit('/').next().unwrap_or(path);
    match file.rsplit_once('.') {
        Some((_, ext)) => IMAGE_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

/// Picks the box art URL, substituting [`NO_BOX_ART_URL`] when absent or not an image.
fn box_art_or_placeholder(candidate: Option<&str>) -> String {
    match candidate.map(str::trim).filter(|s| !s.is_empty()) {
        Some(url) if has_image_extension(url) => url.to_string(),
        Some(url) => {
            trace!("Box art is not an image, using placeholder: {}", url);
            NO_BOX_ART_URL.to_string()
        }
        None => NO_BOX_ART_URL.to_string(),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Normalizes a North American search-index hit.
pub fn normalize_index_hit(hit: &IndexHit) -> Result<SwitchGame, NormalizeError> {
    let missing = |field| NormalizeError::MissingField { title: hit.title.clone(), field };

    let msrp = hit.msrp.ok_or_else(|| missing("msrp"))?;
    let sale_price = hit.sale_price.ok_or_else(|| missing("salePrice"))?;
    let raw_nsuid = hit.nsuid.as_ref().ok_or_else(|| missing("nsuid"))?;
    let nsuid = raw_nsuid.as_u64().ok_or_else(|| NormalizeError::InvalidField {
        title: hit.title.clone(),
        field: "nsuid",
        value: format!("{:?}", raw_nsuid),
    })?;

    let box_art = non_empty(&hit.boxart).or_else(|| non_empty(&hit.gallery));

    Ok(SwitchGame {
        nsuid,
        title: hit.title.clone(),
        box_art_url: box_art_or_placeholder(box_art),
        normal_price: Some(Price::dollars(msrp)),
        sale_price: Some(Price::dollars(sale_price)),
        percent_off: percent_off(msrp, sale_price),
    })
}

/// Normalizes a geo-search document. Prices are filled in later from the
/// price lookup.
pub fn normalize_geo_doc(doc: &GeoDoc) -> Result<SwitchGame, NormalizeError> {
    let first = doc.nsuid_txt.first().ok_or_else(|| NormalizeError::MissingField {
        title: doc.title.clone(),
        field: "nsuid_txt",
    })?;
    let nsuid = first.trim().parse::<u64>().map_err(|_| NormalizeError::InvalidField {
        title: doc.title.clone(),
        field: "nsuid_txt",
        value: first.clone(),
    })?;
    let discount =
        doc.price_discount_percentage_f.ok_or_else(|| NormalizeError::MissingField {
            title: doc.title.clone(),
            field: "price_discount_percentage_f",
        })?;

    let image_url = non_empty(&doc.image_url).map(absolute_url);

    Ok(SwitchGame {
        nsuid,
        title: doc.title.clone(),
        box_art_url: box_art_or_placeholder(image_url.as_deref()),
        normal_price: None,
        sale_price: None,
        percent_off: discount.round().clamp(0.0, 100.0) as u8,
    })
}

/// Extracts the nsuid and prices from a price lookup entry.
pub fn normalize_price_entry(entry: PriceEntry) -> Result<(u64, ItemPricing), NormalizeError> {
    let title_id = entry.title_id.ok_or(NormalizeError::MissingField {
        title: String::new(),
        field: "title_id",
    })?;
    let nsuid = title_id.as_u64().ok_or_else(|| NormalizeError::InvalidField {
        title: String::new(),
        field: "title_id",
        value: format!("{:?}", title_id),
    })?;
    let normal_price = entry
        .regular_price
        .and_then(|p| p.amount)
        .ok_or_else(|| NormalizeError::MissingField {
            title: nsuid.to_string(),
            field: "regular_price.amount",
        })?;
    let sale_price =
        entry.discount_price.and_then(|p| p.amount).map(Price::from).unwrap_or(Price::Unknown);

    Ok((nsuid, ItemPricing { normal_price: normal_price.into(), sale_price }))
}

//! eShop countries and the search backend each one is served by.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported eShop countries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    At,
    Be,
    Ca,
    Ch,
    De,
    Es,
    Fr,
    Gb,
    It,
    Nl,
    Pt,
    Ru,
    #[default]
    Us,
    Za,
}

/// Which upstream search API serves a region, with the per-class settings it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionClass {
    /// Paginated facet search index (North America).
    IndexSearch { index_name: &'static str },
    /// Record-count search plus a separate price lookup (Europe and others).
    GeoSearch { language: &'static str },
}

impl RegionClass {
    /// Short label used in listings and logs.
    pub fn label(&self) -> &'static str {
        match self {
            RegionClass::IndexSearch { .. } => "index-search",
            RegionClass::GeoSearch { .. } => "geo-search",
        }
    }
}

impl Region {
    /// Returns the two-letter country code, upper case.
    pub fn code(&self) -> &'static str {
        match self {
            Region::At => "AT",
            Region::Be => "BE",
            Region::Ca => "CA",
            Region::Ch => "CH",
            Region::De => "DE",
            Region::Es => "ES",
            Region::Fr => "FR",
            Region::Gb => "GB",
            Region::It => "IT",
            Region::Nl => "NL",
            Region::Pt => "PT",
            Region::Ru => "RU",
            Region::Us => "US",
            Region::Za => "ZA",
        }
    }

    /// Returns the display name of the country.
    pub fn name(&self) -> &'static str {
        match self {
            Region::At => "Austria",
            Region::Be => "Belgium",
            Region::Ca => "Canada",
            Region::Ch => "Schweiz/Suisse/Svizzera",
            Region::De => "Germany",
            Region::Es => "Spain",
            Region::Fr => "France",
            Region::Gb => "UK/Ireland",
            Region::It => "Italy",
            Region::Nl => "Netherlands",
            Region::Pt => "Portugal",
            Region::Ru => "Russia",
            Region::Us => "United States",
            Region::Za => "South Africa",
        }
    }

    /// Returns the language code for the region. Always lower case; the
    /// European search endpoint rejects upper-case language segments.
    pub fn language(&self) -> &'static str {
        match self {
            Region::At => "at",
            Region::Be | Region::Nl => "nl",
            Region::Ca | Region::Gb | Region::Us => "en",
            Region::Ch | Region::De => "de",
            Region::Es => "es",
            Region::Fr => "fr",
            Region::It => "it",
            Region::Pt => "pt",
            Region::Ru => "ru",
            Region::Za => "za",
        }
    }

    /// Returns the backend class for this region.
    pub fn class(&self) -> RegionClass {
        match self {
            Region::Ca => RegionClass::IndexSearch { index_name: "ncom_game_en_ca" },
            Region::Us => RegionClass::IndexSearch { index_name: "ncom_game_en_us" },
            _ => RegionClass::GeoSearch { language: self.language() },
        }
    }

    /// Returns true if the region is served by the facet search index.
    pub fn is_index_search(&self) -> bool {
        matches!(self.class(), RegionClass::IndexSearch { .. })
    }

    /// Returns all supported regions.
    pub fn all() -> &'static [Region] {
        &[
            Region::At,
            Region::Be,
            Region::Ca,
            Region::Ch,
            Region::De,
            Region::Es,
            Region::Fr,
            Region::Gb,
            Region::It,
            Region::Nl,
            Region::Pt,
            Region::Ru,
            Region::Us,
            Region::Za,
        ]
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Region {
    type Err = RegionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        if wanted.is_empty() {
            return Err(RegionParseError(s.to_string()));
        }

        // "uk" is what people type for GB.
        if wanted == "uk" {
            return Ok(Region::Gb);
        }

        Region::all()
            .iter()
            .copied()
            .find(|r| {
                r.code().eq_ignore_ascii_case(&wanted) || r.name().to_lowercase() == wanted
            })
            .ok_or_else(|| RegionParseError(s.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct RegionParseError(String);

impl fmt::Display for RegionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<&str> = Region::all().iter().map(|r| r.code()).collect();
        write!(f, "Unknown country '{}'. Valid countries: {}", self.0, codes.join(", "))
    }
}

impl std::error::Error for RegionParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_parsing() {
        assert_eq!(Region::from_str("us").unwrap(), Region::Us);
        assert_eq!(Region::from_str("US").unwrap(), Region::Us);
        assert_eq!(Region::from_str("united states").unwrap(), Region::Us);
        assert_eq!(Region::from_str("de").unwrap(), Region::De);
        assert_eq!(Region::from_str("Germany").unwrap(), Region::De);
        assert_eq!(Region::from_str("gb").unwrap(), Region::Gb);
        assert_eq!(Region::from_str("uk").unwrap(), Region::Gb);
        assert_eq!(Region::from_str(" za ").unwrap(), Region::Za);
        assert_eq!(Region::from_str("schweiz/suisse/svizzera").unwrap(), Region::Ch);

        assert!(Region::from_str("jp").is_err());
        assert!(Region::from_str("").is_err());
    }

    #[test]
    fn test_every_code_round_trips_through_from_str() {
        for region in Region::all() {
            assert_eq!(Region::from_str(region.code()).unwrap(), *region);
        }
    }

    #[test]
    fn test_index_search_regions() {
        assert_eq!(
            Region::Us.class(),
            RegionClass::IndexSearch { index_name: "ncom_game_en_us" }
        );
        assert_eq!(
            Region::Ca.class(),
            RegionClass::IndexSearch { index_name: "ncom_game_en_ca" }
        );

        let index: Vec<Region> =
            Region::all().iter().copied().filter(Region::is_index_search).collect();
        assert_eq!(index, vec![Region::Ca, Region::Us]);
    }

    #[test]
    fn test_geo_search_languages() {
        assert_eq!(Region::De.class(), RegionClass::GeoSearch { language: "de" });
        assert_eq!(Region::Be.class(), RegionClass::GeoSearch { language: "nl" });
        assert_eq!(Region::Ch.class(), RegionClass::GeoSearch { language: "de" });
        assert_eq!(Region::Gb.class(), RegionClass::GeoSearch { language: "en" });
        assert_eq!(Region::At.class(), RegionClass::GeoSearch { language: "at" });
        assert_eq!(Region::Za.class(), RegionClass::GeoSearch { language: "za" });
    }

    #[test]
    fn test_languages_are_lowercase() {
        for region in Region::all() {
            let lang = region.language();
            assert_eq!(lang, lang.to_lowercase(), "{} has upper-case language", region);
        }
    }

    #[test]
    fn test_region_display_and_default() {
        assert_eq!(Region::De.to_string(), "DE");
        assert_eq!(Region::default(), Region::Us);
        assert_eq!(Region::all().len(), 14);
    }

    #[test]
    fn test_region_parse_error_display() {
        let msg = Region::from_str("xyz").unwrap_err().to_string();
        assert!(msg.contains("xyz"));
        assert!(msg.contains("Valid countries"));
        assert!(msg.contains("DE"));
    }

    #[test]
    fn test_region_serde() {
        assert_eq!(serde_json::to_string(&Region::De).unwrap(), "\"DE\"");
        let parsed: Region = serde_json::from_str("\"GB\"").unwrap();
        assert_eq!(parsed, Region::Gb);
    }

    #[test]
    fn test_class_label() {
        assert_eq!(Region::Us.class().label(), "index-search");
        assert_eq!(Region::Fr.class().label(), "geo-search");
    }
}

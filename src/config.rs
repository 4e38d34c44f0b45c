//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::eshop::client::{DEFAULT_ALGOLIA_API_KEY, DEFAULT_ALGOLIA_APP_ID};
use crate::eshop::regions::Region;
use crate::filters::Wishlist;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// eShop country
    #[serde(default)]
    pub country: Region,

    /// Title prefixes to watch for
    #[serde(default)]
    pub wishlist: Vec<String>,

    /// Seconds between refreshes in watch mode
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Delay between page requests in milliseconds
    #[serde(default)]
    pub delay_ms: u64,

    /// Random jitter added to the page delay (0 to this value)
    #[serde(default)]
    pub delay_jitter_ms: u64,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Search application id for the North American index
    #[serde(default = "default_algolia_app_id")]
    pub algolia_app_id: String,

    /// Search-only API key for the North American index
    #[serde(default = "default_algolia_api_key")]
    pub algolia_api_key: String,
}

fn default_scan_interval_secs() -> u64 {
    600
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_algolia_app_id() -> String {
    DEFAULT_ALGOLIA_APP_ID.to_string()
}

fn default_algolia_api_key() -> String {
    DEFAULT_ALGOLIA_API_KEY.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            country: Region::Us,
            wishlist: Vec::new(),
            scan_interval_secs: default_scan_interval_secs(),
            format: OutputFormat::Table,
            proxy: None,
            delay_ms: 0,
            delay_jitter_ms: 0,
            timeout_secs: default_timeout_secs(),
            algolia_app_id: default_algolia_app_id(),
            algolia_api_key: default_algolia_api_key(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("eshop-wishlist").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides. Unparseable values are ignored.
    pub fn with_env(mut self) -> Self {
        if let Ok(country) = std::env::var("ESHOP_COUNTRY") {
            if let Ok(c) = country.parse() {
                self.country = c;
            }
        }

        if let Ok(wishlist) = std::env::var("ESHOP_WISHLIST") {
            let terms = split_terms(&wishlist);
            if !terms.is_empty() {
                self.wishlist = terms;
            }
        }

        if let Ok(interval) = std::env::var("ESHOP_SCAN_INTERVAL") {
            if let Ok(secs) = interval.parse() {
                self.scan_interval_secs = secs;
            }
        }

        if let Ok(proxy) = std::env::var("ESHOP_PROXY") {
            self.proxy = Some(proxy);
        }

        self
    }

    /// Checks the settings a fetch depends on and builds the wishlist.
    pub fn validate(&self) -> Result<Wishlist> {
        if self.scan_interval_secs == 0 {
            anyhow::bail!("scan_interval_secs must be greater than zero");
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be greater than zero");
        }
        Wishlist::new(self.wishlist.iter().map(|t| t.trim().to_string()))
            .context("Invalid wishlist in configuration")
    }

    /// Refresh interval for watch mode.
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }
}

/// Splits a comma-separated list, dropping blank entries.
fn split_terms(value: &str) -> Vec<String> {
    value.split(',').map(str::trim).filter(|t| !t.is_empty()).map(String::from).collect()
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.country, Region::Us);
        assert!(config.wishlist.is_empty());
        assert_eq!(config.scan_interval_secs, 600);
        assert_eq!(config.scan_interval(), Duration::from_secs(600));
        assert_eq!(config.format, OutputFormat::Table);
        assert_eq!(config.delay_ms, 0);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.algolia_app_id, DEFAULT_ALGOLIA_APP_ID);
        assert!(config.proxy.is_none());
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("csv".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);

        let err = "invalid".parse::<OutputFormat>().unwrap_err();
        assert!(err.contains("Unknown format"));
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Table.to_string(), "table");
        assert_eq!(OutputFormat::Markdown.to_string(), "markdown");
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            country = "DE"
            wishlist = ["Aggelos", "Dead Cells"]
            scan_interval_secs = 300
            format = "json"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.country, Region::De);
        assert_eq!(config.wishlist, vec!["Aggelos", "Dead Cells"]);
        assert_eq!(config.scan_interval_secs, 300);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.algolia_api_key, DEFAULT_ALGOLIA_API_KEY);
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            country = "GB"
            wishlist = ["Carrion"]
            "#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.country, Region::Gb);
        assert_eq!(config.wishlist, vec!["Carrion"]);
    }

    #[test]
    fn test_config_from_file_not_found() {
        let err = Config::from_file("/nonexistent/path/config.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_config_from_file_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml {{{{").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_config_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"country = "CA""#).unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.country, Region::Ca);
    }

    #[test]
    fn test_config_with_env() {
        let orig_country = std::env::var("ESHOP_COUNTRY").ok();
        let orig_wishlist = std::env::var("ESHOP_WISHLIST").ok();
        let orig_interval = std::env::var("ESHOP_SCAN_INTERVAL").ok();

        std::env::set_var("ESHOP_COUNTRY", "fr");
        std::env::set_var("ESHOP_WISHLIST", "Shantae, Dead Cells,,");
        std::env::set_var("ESHOP_SCAN_INTERVAL", "not_a_number");

        let config = Config::new().with_env();
        assert_eq!(config.country, Region::Fr);
        assert_eq!(config.wishlist, vec!["Shantae", "Dead Cells"]);
        // Invalid values are ignored.
        assert_eq!(config.scan_interval_secs, 600);

        for (key, orig) in [
            ("ESHOP_COUNTRY", orig_country),
            ("ESHOP_WISHLIST", orig_wishlist),
            ("ESHOP_SCAN_INTERVAL", orig_interval),
        ] {
            match orig {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }

    #[test]
    fn test_validate() {
        let config = Config { wishlist: vec!["Aggelos ".to_string()], ..Config::default() };
        let wishlist = config.validate().unwrap();
        assert_eq!(wishlist.terms(), &["Aggelos".to_string()]);

        let err = Config::default().validate().unwrap_err();
        assert!(err.to_string().contains("Invalid wishlist"));

        let config = Config {
            wishlist: vec!["Aggelos".to_string()],
            scan_interval_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_split_terms() {
        assert_eq!(split_terms("a, b ,,c"), vec!["a", "b", "c"]);
        assert!(split_terms(" , ").is_empty());
    }
}

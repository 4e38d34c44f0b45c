//! eshop-wishlist - Watch the Nintendo eShop for wishlist games on sale

use anyhow::Result;
use clap::{Parser, Subcommand};
use eshop_wishlist::commands::{FetchCommand, WatchCommand};
use eshop_wishlist::config::{Config, OutputFormat};
use eshop_wishlist::eshop::Region;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "eshop-wishlist",
    version,
    about = "Watch the Nintendo eShop for wishlist games on sale",
    long_about = "Checks the eShop of one country for discounted games whose titles start with an entry on your wishlist."
)]
struct Cli {
    /// eShop country code (e.g. US, CA, DE, GB)
    #[arg(long, global = true, env = "ESHOP_COUNTRY")]
    country: Option<Region>,

    /// Wishlist title prefixes (comma-separated)
    #[arg(short, long, global = true, value_delimiter = ',')]
    wishlist: Option<Vec<String>>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "ESHOP_PROXY")]
    proxy: Option<String>,

    /// Delay between page requests in milliseconds
    #[arg(long, global = true)]
    delay: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch wishlist games on sale once
    #[command(alias = "f")]
    Fetch,

    /// Refresh on an interval until Ctrl-C
    #[command(alias = "w")]
    Watch {
        /// Seconds between refreshes
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// List supported countries
    Countries,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(country) = cli.country {
        config.country = country;
    }
    if let Some(wishlist) = cli.wishlist {
        config.wishlist = wishlist;
    }
    if let Some(format) = cli.format {
        config.format = format;
    }
    if let Some(delay) = cli.delay {
        config.delay_ms = delay;
    }
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }

    match cli.command {
        Commands::Fetch => {
            let output = FetchCommand::new(config).execute().await?;
            println!("{}", output);
        }

        Commands::Watch { interval } => {
            if let Some(secs) = interval {
                config.scan_interval_secs = secs;
            }
            WatchCommand::new(config).execute().await?;
        }

        Commands::Countries => {
            println!("Supported eShop countries:\n");
            println!("{:<6} {:<16} {:<14}", "Code", "Name", "Backend");
            println!("{:-<6} {:-<16} {:-<14}", "", "", "");

            for region in Region::all() {
                println!("{:<6} {:<16} {:<14}", region.code(), region.name(), region.class().label());
            }
        }
    }

    Ok(())
}

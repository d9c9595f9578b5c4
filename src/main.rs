use anyhow::Context;
use clap::Parser;
use immoscout_crawler::{load_config, Config, Crawler, HttpFetcher, Immoscout};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Crawl ImmoScout24 search results into normalized listings
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Search URL to crawl, in addition to those in the config (repeatable)
    #[arg(short, long = "url")]
    urls: Vec<String>,

    /// Maximum number of result pages per search URL
    #[arg(short, long)]
    max_pages: Option<u32>,

    /// Write the listings as JSON to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    config.urls.extend(cli.urls.iter().cloned());

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if config.urls.is_empty() {
        anyhow::bail!("No search URLs given; pass --url or list them in the config file");
    }

    let fetcher = HttpFetcher::with_options(&config.http.user_agent, config.http.timeout())
        .context("Failed to create HTTP client")?;
    let crawler = Immoscout::with_settings(config.immoscout_settings(), fetcher)
        .context("Failed to create crawler")?;
    let max_pages = cli.max_pages.or(Some(config.crawler.max_pages));

    let mut listings = Vec::new();
    for url in &config.urls {
        info!("Crawling {} with {}", url, crawler.name());
        listings.extend(crawler.crawl(url, max_pages).await);
    }

    info!("✅ Crawled {} listings", listings.len());
    for (i, listing) in listings.iter().enumerate() {
        info!(
            "{}. {} | {} | {} rooms, {} m² | {}",
            i + 1,
            listing.title,
            listing.address,
            listing.rooms,
            listing.size,
            listing.url
        );
    }

    let json = serde_json::to_string_pretty(&listings)?;
    match &cli.output {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("💾 Saved listings to {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}

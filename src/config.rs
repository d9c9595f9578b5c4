//! Configuration file handling
//!
//! ```toml
//! urls = ["https://www.immoscout24.ch/de/immobilien/mieten/ort-zuerich?pt=35h&nrf=2"]
//!
//! [crawler]
//! origin = "https://www.immoscout24.ch"
//! max-pages = 50
//!
//! [http]
//! user-agent = "Mozilla/5.0 ..."
//! timeout-secs = 30
//!
//! [logging]
//! level = "info"
//! ```

use crate::error::ConfigError;
use crate::fetch::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::scrapers::types::{IMMOSCOUT_ORIGIN, RESULT_LIMIT};
use crate::scrapers::ImmoscoutSettings;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
    /// Search URLs to crawl
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Site origin listing URLs are built from
    pub origin: String,
    /// Page cap per search URL
    pub max_pages: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            origin: IMMOSCOUT_ORIGIN.to_string(),
            max_pages: RESULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Crawler settings for the configured origin
    pub fn immoscout_settings(&self) -> ImmoscoutSettings {
        ImmoscoutSettings {
            result_limit: self.crawler.max_pages,
            ..ImmoscoutSettings::with_origin(self.crawler.origin.as_str())
        }
    }
}

/// Loads, parses and validates a configuration file
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Validates a configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let origin = url::Url::parse(&config.crawler.origin)
        .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", config.crawler.origin, e)))?;
    if !matches!(origin.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "origin must use http or https: {}",
            config.crawler.origin
        )));
    }

    if config.crawler.max_pages == 0 {
        return Err(ConfigError::Validation(
            "max-pages must be at least 1".to_string(),
        ));
    }

    if config.http.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be at least 1".to_string(),
        ));
    }

    for search_url in &config.urls {
        url::Url::parse(search_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", search_url, e)))?;
    }

    Ok(())
}

use thiserror::Error;

/// A fetched page did not contain the data the crawler expects.
///
/// Either variant is fatal for the page and aborts the whole crawl call.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("no script node contains the state marker {marker:?}")]
    MissingStateBlock { marker: String },

    #[error("could not slice JSON after landmark {landmark}: {reason}")]
    MalformedSlice { landmark: String, reason: String },
}

/// A raw listing lacks one of its identifying fields.
#[derive(Debug, Error)]
#[error("listing is missing required field `{missing}`")]
pub struct ListingIncomplete {
    pub missing: &'static str,
}

/// Errors raised by a [`PageFetcher`](crate::fetch::PageFetcher).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("connection to {host} failed: {source}")]
    Connectivity {
        host: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Anything that aborts a crawl call.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("extraction failed for {url}: {source}")]
    Extraction {
        url: String,
        #[source]
        source: ExtractionError,
    },

    #[error("invalid landmark pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

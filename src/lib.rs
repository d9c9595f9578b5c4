//! Crawler for ImmoScout24 search results
//!
//! Fetches result pages, slices the listing and paging data out of the
//! embedded hydration state, and normalizes every listing into a
//! [`CanonicalListing`].

pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod scrapers;

pub use config::{load_config, Config};
pub use error::{ConfigError, CrawlError, ExtractionError, FetchError, ListingIncomplete};
pub use fetch::{HttpFetcher, PageFetcher};
pub use models::{CanonicalListing, PagingMetadata, RawListing};
pub use scrapers::{Crawler, Immoscout, ImmoscoutSettings};

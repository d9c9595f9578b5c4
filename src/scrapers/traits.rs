use crate::error::{CrawlError, ExtractionError};
use crate::models::CanonicalListing;
use async_trait::async_trait;
use scraper::Html;

/// Common contract for all site crawlers
///
/// A caller holding several crawlers can hand the same URL to each of them;
/// crawlers that do not serve that site return an empty list without fetching.
#[async_trait]
pub trait Crawler: Send + Sync {
    /// Name stamped into every listing this crawler produces
    fn name(&self) -> &str;

    /// Load as many listings as possible from `url`, fetching at most
    /// `max_pages` pages. Never fails; problems are logged and yield `[]`.
    async fn crawl(&self, url: &str, max_pages: Option<u32>) -> Vec<CanonicalListing>;

    /// Fetch one page of a search whose URL carries the page placeholder
    async fn get_page(&self, search_url: &str, page_no: u32) -> Result<String, CrawlError>;

    /// Extract the listings of one parsed result page
    fn extract_data(&self, html: &Html) -> Result<Vec<CanonicalListing>, ExtractionError>;
}

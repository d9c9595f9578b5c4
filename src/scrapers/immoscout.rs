use crate::error::{CrawlError, ExtractionError, FetchError};
use crate::fetch::PageFetcher;
use crate::models::{CanonicalListing, PagingMetadata, RawListing};
use crate::scrapers::extract::{locate_state_script, SliceExtractor};
use crate::scrapers::normalize::normalize_listing;
use crate::scrapers::traits::Crawler;
use crate::scrapers::types::ImmoscoutSettings;
use async_trait::async_trait;
use regex::Regex;
use scraper::Html;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

/// Stands in for the page number in a search URL template
pub const PAGE_PLACEHOLDER: &str = "{page}";

/// Crawler for ImmoScout24 search result pages
pub struct Immoscout {
    settings: ImmoscoutSettings,
    fetcher: Box<dyn PageFetcher>,
    url_pattern: Regex,
    page_param: Regex,
    listings: SliceExtractor,
    paging: SliceExtractor,
}

impl Immoscout {
    /// Create a crawler for the live site
    pub fn new(fetcher: impl PageFetcher + 'static) -> Result<Self, CrawlError> {
        Self::with_settings(ImmoscoutSettings::default(), fetcher)
    }

    pub fn with_settings(
        settings: ImmoscoutSettings,
        fetcher: impl PageFetcher + 'static,
    ) -> Result<Self, CrawlError> {
        let url_pattern = Regex::new(&format!("^{}", regex::escape(&settings.origin)))?;
        let page_param = Regex::new(r"([?&])pn=[0-9]*")?;
        let listings = SliceExtractor::new(&settings.listings)?;
        let paging = SliceExtractor::new(&settings.paging)?;

        Ok(Self {
            settings,
            fetcher: Box::new(fetcher),
            url_pattern,
            page_param,
            listings,
            paging,
        })
    }

    pub fn settings(&self) -> &ImmoscoutSettings {
        &self.settings
    }

    /// Whether `url` belongs to this crawler's site
    pub fn matches(&self, url: &str) -> bool {
        self.url_pattern.is_match(url)
    }

    /// Turn a search URL into a template with [`PAGE_PLACEHOLDER`] as the
    /// page number, replacing any page number it already carries.
    pub fn paginated_search_url(&self, search_url: &str) -> String {
        if self.page_param.is_match(search_url) {
            let replacement = format!("${{1}}pn={}", PAGE_PLACEHOLDER);
            self.page_param
                .replace(search_url, replacement.as_str())
                .into_owned()
        } else if search_url.contains('?') {
            format!("{}&pn={}", search_url, PAGE_PLACEHOLDER)
        } else {
            format!("{}?pn={}", search_url, PAGE_PLACEHOLDER)
        }
    }

    /// Loads the listings starting at `search_url`, following the paging
    /// metadata of the first page up to `max_pages` pages.
    ///
    /// Any failure aborts the whole call; listings from earlier pages are
    /// dropped with it.
    pub async fn get_results(
        &self,
        search_url: &str,
        max_pages: u32,
    ) -> Result<Vec<CanonicalListing>, CrawlError> {
        let search_url = self.paginated_search_url(search_url);
        debug!("Got search URL {}", search_url);

        // load first page to get number of entries
        let mut page_no = 1;
        let body = self.get_page(&search_url, page_no).await?;
        let (mut entries, paging) = self.parse_first_page(&body, &search_url, page_no)?;
        let no_of_pages = paging.total_pages;

        while page_no < no_of_pages && page_no < max_pages {
            debug!(
                "(Next page) Number of page: {} / Total number of pages: {}",
                page_no, no_of_pages
            );
            page_no += 1;
            let body = self.get_page(&search_url, page_no).await?;
            entries.extend(self.parse_page(&body, &search_url, page_no)?);
        }

        Ok(entries)
    }

    /// Paging metadata embedded in a result page
    pub fn get_paging(&self, html: &Html) -> Result<PagingMetadata, ExtractionError> {
        let script = locate_state_script(html, &self.settings.state_marker)?;
        self.paging.extract(&script)
    }

    fn parse_first_page(
        &self,
        body: &str,
        search_url: &str,
        page_no: u32,
    ) -> Result<(Vec<CanonicalListing>, PagingMetadata), CrawlError> {
        let html = Html::parse_document(body);
        let entries = self.extract_data(&html);
        let paging = self.get_paging(&html);

        match (entries, paging) {
            (Ok(entries), Ok(paging)) => Ok((entries, paging)),
            (Err(source), _) | (_, Err(source)) => Err(CrawlError::Extraction {
                url: page_url(search_url, page_no),
                source,
            }),
        }
    }

    fn parse_page(
        &self,
        body: &str,
        search_url: &str,
        page_no: u32,
    ) -> Result<Vec<CanonicalListing>, CrawlError> {
        let html = Html::parse_document(body);
        self.extract_data(&html)
            .map_err(|source| CrawlError::Extraction {
                url: page_url(search_url, page_no),
                source,
            })
    }
}

#[async_trait]
impl Crawler for Immoscout {
    fn name(&self) -> &str {
        "Immoscout"
    }

    async fn crawl(&self, url: &str, max_pages: Option<u32>) -> Vec<CanonicalListing> {
        if !self.matches(url) {
            return Vec::new();
        }

        let max_pages = max_pages.unwrap_or(self.settings.result_limit);
        match self.get_results(url, max_pages).await {
            Ok(entries) => {
                info!("{} found {} listings for {}", self.name(), entries.len(), url);
                entries
            }
            Err(CrawlError::Fetch(FetchError::Connectivity { host, .. })) => {
                warn!("Connection to {} failed.", host);
                Vec::new()
            }
            Err(e) => {
                error!("Crawling {} failed: {}", url, e);
                Vec::new()
            }
        }
    }

    async fn get_page(&self, search_url: &str, page_no: u32) -> Result<String, CrawlError> {
        let body = self.fetcher.fetch(&page_url(search_url, page_no)).await?;
        Ok(body)
    }

    fn extract_data(&self, html: &Html) -> Result<Vec<CanonicalListing>, ExtractionError> {
        let script = locate_state_script(html, &self.settings.state_marker)?;
        let flats: Vec<Value> = self.listings.extract(&script)?;

        let mut entries = Vec::with_capacity(flats.len());
        let mut seen = HashSet::new();
        for flat in flats {
            let raw = RawListing::from(flat);
            let details = match normalize_listing(&raw, self.name(), &self.settings.origin) {
                Ok(details) => details,
                Err(e) => {
                    // the rest of the page is dropped along with this entry
                    error!("Cannot load details from flat {:?}: {}", raw.0, e);
                    break;
                }
            };

            if !seen.insert(details.id.clone()) {
                debug!("Skipping duplicate listing {}", details.id);
                continue;
            }
            entries.push(details);
        }

        debug!("Number of entries found: {}", entries.len());
        Ok(entries)
    }
}

fn page_url(search_url: &str, page_no: u32) -> String {
    search_url.replace(PAGE_PLACEHOLDER, &page_no.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    const SEARCH_URL: &str =
        "https://www.immoscout24.ch/de/immobilien/mieten/ort-zuerich?pt=35h&nrf=2";

    /// In-memory fetcher recording every requested URL
    #[derive(Clone, Default)]
    struct MockFetcher {
        pages: HashMap<String, String>,
        unreachable: Option<String>,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl MockFetcher {
        fn with_pages(pages: Vec<(u32, String)>) -> Self {
            let pages = pages
                .into_iter()
                .map(|(page_no, body)| (format!("{}&pn={}", SEARCH_URL, page_no), body))
                .collect();
            Self {
                pages,
                ..Self::default()
            }
        }

        fn unreachable_at(mut self, page_no: u32) -> Self {
            self.unreachable = Some(format!("{}&pn={}", SEARCH_URL, page_no));
            self
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for MockFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.requests.lock().unwrap().push(url.to_string());
            if self.unreachable.as_deref() == Some(url) {
                return Err(FetchError::Connectivity {
                    host: "www.immoscout24.ch".to_string(),
                    source: "connection refused".into(),
                });
            }
            self.pages.get(url).cloned().ok_or(FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    fn listing(id: u64) -> Value {
        json!({
            "id": id,
            "propertyUrl": format!("/de/d/wohnung-mieten-zuerich/{}", id),
            "title": format!("Wohnung {}", id),
            "street": "Bahnhofstrasse 1",
            "zip": "8000",
            "cityName": "Zürich",
            "price": 2000 + id,
        })
    }

    fn page(listings: Vec<Value>, total_pages: u32) -> String {
        let items_on_page = listings.len() as u32;
        let paging = json!({
            "totalPages": total_pages,
            "itemsOnPage": items_on_page,
            "totalMatches": items_on_page * total_pages,
        });
        format!(
            r#"<html><head><script>var dataLayer = [];</script><script>window.__INITIAL_STATE__={{"resultList":{{"listData":{},"pagingData":{},"viewData":{{"mode":"list"}}}}}}</script></head><body></body></html>"#,
            Value::Array(listings),
            paging
        )
    }

    fn three_pages() -> Vec<(u32, String)> {
        (1..=3)
            .map(|p| (p, page(vec![listing(p as u64 * 100 + 1), listing(p as u64 * 100 + 2)], 3)))
            .collect()
    }

    fn crawler(fetcher: &MockFetcher) -> Immoscout {
        Immoscout::new(fetcher.clone()).unwrap()
    }

    fn ids(entries: &[CanonicalListing]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_crawl_follows_all_pages_in_order() {
        let fetcher = MockFetcher::with_pages(three_pages());
        let entries = crawler(&fetcher).crawl(SEARCH_URL, None).await;

        assert_eq!(ids(&entries), vec!["101", "102", "201", "202", "301", "302"]);
        assert_eq!(fetcher.requests().len(), 3);
        for entry in &entries {
            assert!(entry.url.starts_with("https://www.immoscout24.ch/"));
            assert_eq!(entry.crawler, "Immoscout");
        }
    }

    #[tokio::test]
    async fn test_crawl_respects_page_cap() {
        let fetcher = MockFetcher::with_pages(three_pages());
        let entries = crawler(&fetcher).crawl(SEARCH_URL, Some(2)).await;

        assert_eq!(ids(&entries), vec!["101", "102", "201", "202"]);
        assert_eq!(
            fetcher.requests(),
            vec![
                format!("{}&pn=1", SEARCH_URL),
                format!("{}&pn=2", SEARCH_URL)
            ]
        );
    }

    #[tokio::test]
    async fn test_single_page_fetches_once() {
        let fetcher = MockFetcher::with_pages(vec![(1, page(vec![listing(1)], 1))]);
        let entries = crawler(&fetcher).crawl(SEARCH_URL, Some(20)).await;

        assert_eq!(entries.len(), 1);
        assert_eq!(fetcher.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_first_page_stops() {
        let fetcher = MockFetcher::with_pages(vec![(1, page(vec![], 0))]);
        let entries = crawler(&fetcher).crawl(SEARCH_URL, None).await;

        assert!(entries.is_empty());
        assert_eq!(fetcher.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_foreign_url_is_not_fetched() {
        let fetcher = MockFetcher::with_pages(three_pages());
        let entries = crawler(&fetcher)
            .crawl(
                "https://www.immoscout.ch/fr/immobilier/louer/lieu-geneve?pt=35h&nrf=2",
                Some(20),
            )
            .await;

        assert!(entries.is_empty());
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_connectivity_failure_discards_earlier_pages() {
        let fetcher = MockFetcher::with_pages(three_pages()).unreachable_at(3);
        let entries = crawler(&fetcher).crawl(SEARCH_URL, None).await;

        assert!(entries.is_empty());
        assert_eq!(fetcher.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_connectivity_failure_surfaces_from_get_results() {
        let fetcher = MockFetcher::with_pages(three_pages()).unreachable_at(2);
        let err = crawler(&fetcher)
            .get_results(SEARCH_URL, 50)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CrawlError::Fetch(FetchError::Connectivity { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_state_block_aborts_crawl() {
        let mut pages = three_pages();
        pages[1].1 = "<html><body><p>Access denied</p></body></html>".to_string();
        let fetcher = MockFetcher::with_pages(pages);

        let err = crawler(&fetcher)
            .get_results(SEARCH_URL, 50)
            .await
            .unwrap_err();
        match err {
            CrawlError::Extraction { url, source } => {
                assert_eq!(url, format!("{}&pn=2", SEARCH_URL));
                assert!(matches!(source, ExtractionError::MissingStateBlock { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(crawler(&fetcher).crawl(SEARCH_URL, None).await.is_empty());
    }

    #[test]
    fn test_extract_data_matches_items_on_page() {
        let fetcher = MockFetcher::default();
        let crawler = crawler(&fetcher);
        let html = Html::parse_document(&page(vec![listing(1), listing(2), listing(3)], 1));

        let entries = crawler.extract_data(&html).unwrap();
        let paging = crawler.get_paging(&html).unwrap();
        assert_eq!(entries.len() as u32, paging.items_on_page);
        assert_eq!(paging.total_matches, 3);
    }

    #[test]
    fn test_extract_data_stops_at_incomplete_listing() {
        let fetcher = MockFetcher::default();
        let crawler = crawler(&fetcher);
        let html = Html::parse_document(&page(
            vec![listing(1), json!({"title": "no id"}), listing(3)],
            1,
        ));

        let entries = crawler.extract_data(&html).unwrap();
        assert_eq!(ids(&entries), vec!["1"]);
    }

    #[test]
    fn test_extract_data_skips_duplicates_on_page() {
        let fetcher = MockFetcher::default();
        let crawler = crawler(&fetcher);
        let html = Html::parse_document(&page(vec![listing(1), listing(1), listing(2)], 1));

        let entries = crawler.extract_data(&html).unwrap();
        assert_eq!(ids(&entries), vec!["1", "2"]);
    }

    #[test]
    fn test_extract_data_is_deterministic() {
        let fetcher = MockFetcher::default();
        let crawler = crawler(&fetcher);
        let html = Html::parse_document(&page(vec![listing(1), listing(2)], 1));

        assert_eq!(
            crawler.extract_data(&html).unwrap(),
            crawler.extract_data(&html).unwrap()
        );
    }

    #[test]
    fn test_paginated_search_url() {
        let fetcher = MockFetcher::default();
        let crawler = crawler(&fetcher);

        assert_eq!(
            crawler.paginated_search_url(SEARCH_URL),
            format!("{}&pn={{page}}", SEARCH_URL)
        );
        assert_eq!(
            crawler.paginated_search_url(&format!("{}&pn=4", SEARCH_URL)),
            format!("{}&pn={{page}}", SEARCH_URL)
        );
        assert_eq!(
            crawler.paginated_search_url("https://www.immoscout24.ch/de/immobilien/mieten/ort-bern?pn=3&nrf=2"),
            "https://www.immoscout24.ch/de/immobilien/mieten/ort-bern?pn={page}&nrf=2"
        );
        assert_eq!(
            crawler.paginated_search_url("https://www.immoscout24.ch/de/immobilien/mieten/ort-bern"),
            "https://www.immoscout24.ch/de/immobilien/mieten/ort-bern?pn={page}"
        );
    }
}

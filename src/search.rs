//! Google Patents search link collection.
//!
//! Pages through keyword search results for a filing-year window and gathers
//! unique patent page URLs, stopping at the first page that yields none.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::fetch::http::DEFAULT_USER_AGENT;

/// Public Google Patents origin; search hrefs are resolved against it.
pub const GOOGLE_PATENTS: &str = "https://patents.google.com/";

const PATENT_PREFIX: &str = "https://patents.google.com/patent/";

static ANCHORS: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("static selector"));

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("start year {start} is after end year {end}")]
    InvertedRange { start: i32, end: i32 },

    #[error("year {0} is out of range")]
    InvalidYear(i32),

    #[error("invalid search endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Keyword plus inclusive year window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub keyword: String,
    after: NaiveDate,
    before: NaiveDate,
}

impl SearchQuery {
    pub fn new(keyword: impl Into<String>, start_year: i32, end_year: i32) -> Result<Self, SearchError> {
        if start_year > end_year {
            return Err(SearchError::InvertedRange {
                start: start_year,
                end: end_year,
            });
        }
        let after =
            NaiveDate::from_ymd_opt(start_year, 1, 1).ok_or(SearchError::InvalidYear(start_year))?;
        let before =
            NaiveDate::from_ymd_opt(end_year, 12, 31).ok_or(SearchError::InvalidYear(end_year))?;
        Ok(Self {
            keyword: keyword.into(),
            after,
            before,
        })
    }

    /// Result page `page` (1-based) under `endpoint`.
    #[must_use]
    pub fn page_url(&self, endpoint: &Url, page: u32) -> Url {
        let mut url = endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", &self.keyword)
            .append_pair("before_date", &self.before.format("%Y-%m-%d").to_string())
            .append_pair("after_date", &self.after.format("%Y-%m-%d").to_string())
            .append_pair("p", &page.to_string());
        url
    }
}

/// Patent page links in one result page, resolved against [`GOOGLE_PATENTS`].
#[must_use]
pub fn collect_patent_links(html: &str) -> BTreeSet<String> {
    let Ok(base) = Url::parse(GOOGLE_PATENTS) else {
        return BTreeSet::new();
    };
    let doc = Html::parse_document(html);

    doc.select(&ANCHORS)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.contains("/patent/"))
        .filter_map(|href| base.join(href).ok())
        .map(String::from)
        .filter(|url| url.starts_with(PATENT_PREFIX))
        .collect()
}

/// Pages through search results with a polite delay between requests.
pub struct LinkCollector {
    client: Client,
    endpoint: Url,
    interval: Duration,
    max_pages: u32,
}

impl LinkCollector {
    pub fn new() -> Result<Self, SearchError> {
        Self::with_endpoint(&format!("{GOOGLE_PATENTS}usearch"))
    }

    /// Point the collector at another search endpoint.
    pub fn with_endpoint(endpoint: &str) -> Result<Self, SearchError> {
        let client = Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .cookie_store(true)
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            endpoint: Url::parse(endpoint)?,
            interval: Duration::from_secs(1),
            max_pages: 100,
        })
    }

    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Collect links until a page yields none, a request fails, or the page cap is hit.
    #[instrument(skip(self), fields(keyword = %query.keyword))]
    pub async fn collect(&self, query: &SearchQuery) -> BTreeSet<String> {
        let mut links = BTreeSet::new();

        for page in 1..=self.max_pages {
            let url = self.page_url(query, page);
            let body = match self.fetch_page(url).await {
                Ok(body) => body,
                Err(e) => {
                    warn!(page, error = %e, "Search page failed, stopping");
                    break;
                }
            };

            let found = collect_patent_links(&body);
            debug!(page, found = found.len(), "Search page parsed");
            if found.is_empty() {
                break;
            }
            links.extend(found);

            if page < self.max_pages && !self.interval.is_zero() {
                tokio::time::sleep(self.interval).await;
            }
        }

        info!(total = links.len(), "Link collection finished");
        links
    }

    fn page_url(&self, query: &SearchQuery, page: u32) -> Url {
        query.page_url(&self.endpoint, page)
    }

    async fn fetch_page(&self, url: Url) -> Result<String, reqwest::Error> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

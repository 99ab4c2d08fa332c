//! Web search scraper backed by the DuckDuckGo HTML endpoint.
//!
//! Results are limited to the last day (`df=d`). Result anchors usually point
//! at a DuckDuckGo redirect (`//duckduckgo.com/l/?uddg=<target>&rut=…`); the
//! target is decoded so items carry the real article link.

use crate::config::{SearchConfig, SourceUrls};
use crate::error::SourceError;
use crate::models::{Item, SourceKind};
use crate::scrapers::SourceFetcher;
use crate::utils::collapse_whitespace;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};

static RESULT_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a.result__a[href]").unwrap());
static UDDG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[?&]uddg=([^&]+)").unwrap());

/// Day-restricted web search over the DuckDuckGo HTML endpoint.
pub struct WebSearch {
    client: reqwest::Client,
    endpoint: String,
    query: String,
    max_results: usize,
}

impl WebSearch {
    /// Create a web search source.
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client.
    /// * `urls` - Source endpoints; `web_search_url` is queried.
    /// * `search` - Query text and the result cap.
    pub fn new(client: reqwest::Client, urls: &SourceUrls, search: &SearchConfig) -> Self {
        Self {
            client,
            endpoint: urls.web_search_url.clone(),
            query: search.web_query.clone(),
            max_results: search.web_max_results,
        }
    }
}

#[async_trait]
impl SourceFetcher for WebSearch {
    fn kind(&self) -> SourceKind {
        SourceKind::WebSearch
    }

    #[instrument(level = "info", skip_all, fields(query = %self.query))]
    async fn fetch(&self) -> Result<Vec<Item>, SourceError> {
        let html = self
            .client
            .get(&self.endpoint)
            .query(&[("q", self.query.as_str()), ("df", "d")])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let items = parse_results(&html, self.max_results);
        info!(count = items.len(), "Collected web search results");
        Ok(items)
    }
}

/// Extract up to `max` results from a results page.
pub fn parse_results(html: &str, max: usize) -> Vec<Item> {
    let document = Html::parse_document(html);
    document
        .select(&RESULT_LINK)
        .filter_map(|a| {
            let title = collapse_whitespace(&a.text().collect::<String>());
            let href = a.value().attr("href")?;
            let url = resolve_redirect(href)?;
            if title.is_empty() {
                debug!(%url, "Result without title");
                return None;
            }
            Some(Item::titled(title, url))
        })
        .take(max)
        .collect()
}

/// Turn a result href into an absolute target URL.
fn resolve_redirect(href: &str) -> Option<String> {
    if let Some(caps) = UDDG.captures(href) {
        return urlencoding::decode(&caps[1]).ok().map(|s| s.into_owned());
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    href.strip_prefix("//").map(|rest| format!("https://{rest}"))
}

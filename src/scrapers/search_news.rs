//! Search-engine news via SerpAPI's Google News engine.
//!
//! Requires `search.serpapi_key`. Results are restricted to the last day and
//! sorted by date on the provider side.

use crate::config::{SearchConfig, SourceUrls};
use crate::error::SourceError;
use crate::models::{Item, SourceKind};
use crate::scrapers::SourceFetcher;
use crate::utils::collapse_whitespace;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, instrument};

/// News from SerpAPI's Google News engine. Without an API key every fetch
/// fails with [`SourceError::NotConfigured`].
pub struct SearchNews {
    client: reqwest::Client,
    endpoint: String,
    query: String,
    api_key: Option<String>,
}

impl SearchNews {
    /// An empty `serpapi_key` counts as missing.
    pub fn new(client: reqwest::Client, urls: &SourceUrls, search: &SearchConfig) -> Self {
        Self {
            client,
            endpoint: urls.search_news_url.clone(),
            query: search.news_query.clone(),
            api_key: search.serpapi_key.clone().filter(|k| !k.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NewsResponse {
    #[serde(default)]
    news_results: Vec<NewsResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
}

#[async_trait]
impl SourceFetcher for SearchNews {
    fn kind(&self) -> SourceKind {
        SourceKind::SearchNews
    }

    #[instrument(level = "info", skip_all, fields(query = %self.query))]
    async fn fetch(&self) -> Result<Vec<Item>, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SourceError::NotConfigured("SERPAPI_KEY".to_string()))?;

        let response: NewsResponse = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", self.query.as_str()),
                ("engine", "google"),
                ("hl", "zh-cn"),
                ("gl", "cn"),
                ("tbs", "qdr:d,sbd:1"),
                ("tbm", "nws"),
                ("num", "100"),
                ("filter", "1"),
                ("api_key", api_key),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let items = into_items(response)?;
        info!(count = items.len(), "Collected search-engine news");
        Ok(items)
    }
}

/// Convert a SerpAPI response into items, surfacing provider-side errors.
pub fn into_items(response: NewsResponse) -> Result<Vec<Item>, SourceError> {
    if let Some(error) = response.error {
        return Err(SourceError::Parse(error));
    }
    Ok(response
        .news_results
        .into_iter()
        .filter_map(|r| {
            let title = collapse_whitespace(r.title.as_deref()?);
            let link = r.link?;
            (!title.is_empty()).then(|| Item::titled(title, link))
        })
        .collect())
}

//! Daily AI news page scraper.

use crate::config::SourceUrls;
use crate::error::SourceError;
use crate::models::{Item, SourceKind};
use crate::scrapers::SourceFetcher;
use crate::utils::collapse_whitespace;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{info, instrument};
use url::Url;

static HEADLINE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.news-item h2 a[href]").unwrap());

/// Headlines from a daily AI news page.
pub struct SiteNews {
    client: reqwest::Client,
    page_url: String,
}

impl SiteNews {
    /// Scrape `urls.site_news_url`; relative links resolve against it.
    pub fn new(client: reqwest::Client, urls: &SourceUrls) -> Self {
        Self {
            client,
            page_url: urls.site_news_url.clone(),
        }
    }
}

#[async_trait]
impl SourceFetcher for SiteNews {
    fn kind(&self) -> SourceKind {
        SourceKind::SiteNews
    }

    #[instrument(level = "info", skip_all, fields(url = %self.page_url))]
    async fn fetch(&self) -> Result<Vec<Item>, SourceError> {
        let base = Url::parse(&self.page_url)
            .map_err(|e| SourceError::NotConfigured(format!("site news url: {e}")))?;
        let html = self
            .client
            .get(base.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let items = parse_news_page(&html, &base);
        info!(count = items.len(), "Collected site news");
        Ok(items)
    }
}

/// Extract the headline link of every news entry, resolving relative links against `base`.
pub fn parse_news_page(html: &str, base: &Url) -> Vec<Item> {
    let document = Html::parse_document(html);
    document
        .select(&HEADLINE)
        .filter_map(|a| {
            let title = collapse_whitespace(&a.text().collect::<String>());
            let href = a.value().attr("href")?;
            let url = base.join(href).ok()?;
            (!title.is_empty()).then(|| Item::titled(title, url.to_string()))
        })
        .collect()
}

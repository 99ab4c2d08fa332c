//! Model-hub listing scraper.
//!
//! Reads the newest-models listing page and turns each model card into an
//! item. Card links are relative (`/Qwen/Qwen3-VL-8B-Thinking`) and are
//! resolved against the canonical hub host rather than the mirror that
//! served the page.

use crate::config::SourceUrls;
use crate::error::SourceError;
use crate::models::{Item, SourceKind};
use crate::scrapers::SourceFetcher;
use crate::utils::collapse_whitespace;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};

static CARD: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article.overview-card-wrapper").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static HEADER: Lazy<Selector> = Lazy::new(|| Selector::parse("header[title]").unwrap());

/// Newest models from the model hub listing page.
///
/// The listing may be fetched from a mirror; item links always point at
/// `link_base`.
pub struct ModelHub {
    client: reqwest::Client,
    page_url: String,
    link_base: String,
}

impl ModelHub {
    /// Create a model hub source.
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client.
    /// * `urls` - `models_url` is scraped and `models_link_base` prefixes every card link.
    pub fn new(client: reqwest::Client, urls: &SourceUrls) -> Self {
        Self {
            client,
            page_url: urls.models_url.clone(),
            link_base: urls.models_link_base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SourceFetcher for ModelHub {
    fn kind(&self) -> SourceKind {
        SourceKind::Models
    }

    #[instrument(level = "info", skip_all, fields(url = %self.page_url))]
    async fn fetch(&self) -> Result<Vec<Item>, SourceError> {
        let html = self
            .client
            .get(&self.page_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let items = parse_listing(&html, &self.link_base);
        info!(count = items.len(), "Collected models");
        Ok(items)
    }
}

/// Extract one item per model card. Cards without a link or a titled header are skipped.
pub fn parse_listing(html: &str, link_base: &str) -> Vec<Item> {
    let document = Html::parse_document(html);
    let mut items = Vec::new();

    for card in document.select(&CARD) {
        let Some(link) = card.select(&LINK).next() else {
            debug!("Model card without link");
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Some(title) = link
            .select(&HEADER)
            .next()
            .and_then(|h| h.value().attr("title"))
            .map(collapse_whitespace)
            .filter(|t| !t.is_empty())
        else {
            debug!(href, "Model card without title");
            continue;
        };
        items.push(Item::titled(title, format!("{link_base}{href}")));
    }
    items
}

//! Source scrapers for the five feeds of a digest.
//!
//! Each scraper implements [`SourceFetcher`] and returns its items in the
//! order the source lists them. Scrapers never retry and hold no mutable
//! state, so the aggregator can run all five at once.
//!
//! # Supported Sources
//!
//! | Kind | Module | Method | Notes |
//! |------|--------|--------|-------|
//! | Papers | [`papers`] | JSON API | Titles translated into one-sentence blurbs |
//! | Models | [`models`] | HTML scraping | Newest models from the model-hub listing |
//! | Site news | [`site_news`] | HTML scraping | Daily AI news page |
//! | Web search | [`web_search`] | HTML scraping | DuckDuckGo HTML endpoint, last day |
//! | Search news | [`search_news`] | JSON API | SerpAPI Google News; requires a key |

pub mod models;
pub mod papers;
pub mod search_news;
pub mod site_news;
pub mod web_search;

use crate::api::Translator;
use crate::config::Config;
use crate::error::SourceError;
use crate::models::{Item, SourceKind};
use async_trait::async_trait;
use std::sync::Arc;

/// A producer of items for one source.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Which digest slot this source fills.
    fn kind(&self) -> SourceKind;

    /// Collect the source's current items, in source order.
    async fn fetch(&self) -> Result<Vec<Item>, SourceError>;
}

/// The five scrapers a digest is built from, one per slot.
#[derive(Clone)]
pub struct SourceSet {
    pub models: Arc<dyn SourceFetcher>,
    pub site_news: Arc<dyn SourceFetcher>,
    pub web_search: Arc<dyn SourceFetcher>,
    pub search_news: Arc<dyn SourceFetcher>,
    pub papers: Arc<dyn SourceFetcher>,
}

impl SourceSet {
    /// Build the production scrapers from configuration.
    pub fn from_config(
        config: &Config,
        client: reqwest::Client,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self {
            models: Arc::new(models::ModelHub::new(client.clone(), &config.sources)),
            site_news: Arc::new(site_news::SiteNews::new(client.clone(), &config.sources)),
            web_search: Arc::new(web_search::WebSearch::new(
                client.clone(),
                &config.sources,
                &config.search,
            )),
            search_news: Arc::new(search_news::SearchNews::new(
                client.clone(),
                &config.sources,
                &config.search,
            )),
            papers: Arc::new(papers::PaperHub::new(client, &config.sources, translator)),
        }
    }
}

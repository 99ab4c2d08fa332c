//! Newest-papers scraper.
//!
//! Pulls the newest agent/NLP/multimodal papers from the paper hub's list API
//! and gives each a one-sentence translated blurb. When translation fails
//! the blurb falls back to the paper's own introduction, cut to 40
//! characters.

use crate::api::Translator;
use crate::config::SourceUrls;
use crate::error::SourceError;
use crate::models::{Item, SourceKind};
use crate::scrapers::SourceFetcher;
use crate::utils::{collapse_whitespace, truncate_chars};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// How many titles are translated at once.
const TRANSLATE_CONCURRENCY: usize = 4;
/// Length of the introduction fallback, in characters.
const FALLBACK_CHARS: usize = 40;

/// Newest papers from the paper hub list API, each with a translated blurb.
pub struct PaperHub {
    client: reqwest::Client,
    api_url: String,
    translator: Arc<dyn Translator>,
}

impl PaperHub {
    /// Create a paper hub source.
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client.
    /// * `urls` - `papers_url` is the list API.
    /// * `translator` - Produces the one-sentence blurb for each title.
    pub fn new(client: reqwest::Client, urls: &SourceUrls, translator: Arc<dyn Translator>) -> Self {
        Self {
            client,
            api_url: urls.papers_url.clone(),
            translator,
        }
    }
}

#[derive(Serialize)]
struct ListRequest<'a> {
    page: u32,
    #[serde(rename = "type")]
    kind: &'a str,
    area: &'a str,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    data: Vec<Paper>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Paper {
    pub title: String,
    pub source: String,
    #[serde(default)]
    pub introduction: String,
}

#[async_trait]
impl SourceFetcher for PaperHub {
    fn kind(&self) -> SourceKind {
        SourceKind::Papers
    }

    #[instrument(level = "info", skip_all, fields(url = %self.api_url))]
    async fn fetch(&self) -> Result<Vec<Item>, SourceError> {
        let request = ListRequest {
            page: 1,
            kind: "newest",
            area: "agent,nlp,multimodal",
        };
        let response: ListResponse = self
            .client
            .post(&self.api_url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let items = annotate(response.data, self.translator.as_ref()).await;
        info!(count = items.len(), "Collected papers");
        Ok(items)
    }
}

/// Attach a blurb to every paper, keeping list order.
pub async fn annotate(papers: Vec<Paper>, translator: &dyn Translator) -> Vec<Item> {
    stream::iter(papers)
        .map(|paper| async move {
            let title = collapse_whitespace(&paper.title);
            let fallback = || truncate_chars(&collapse_whitespace(&paper.introduction), FALLBACK_CHARS);
            let text = match translator.translate(&title).await {
                Ok(t) if !t.is_empty() => t,
                Ok(_) => fallback(),
                Err(e) => {
                    warn!(%title, error = %e, "Translation failed; using introduction");
                    fallback()
                }
            };
            Item::new(title, paper.source, text)
        })
        .buffered(TRANSLATE_CONCURRENCY)
        .collect()
        .await
}

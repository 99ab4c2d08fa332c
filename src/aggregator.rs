//! Digest assembly.
//!
//! The aggregator runs the five scrapers as independent tasks, waits for all
//! of them, and groups what came back into sections:
//!
//! 1. **Models**: the model scraper's first `top_n` items
//! 2. **News**: the first `top_n` items of each news scraper, concatenated
//!    in the order site news, web search, search-engine news
//! 3. **Papers**: the paper scraper's first `top_n` items
//!
//! Sections with nothing in them are left out. A scraper that errors or
//! panics contributes nothing and does not affect the others. The closing
//! phrase is generated alongside the scrapers and falls back to a fixed
//! phrase when generation fails.
//!
//! Items are not deduplicated: the same link reported by two sources shows
//! up twice.

use crate::api::WarmPhraseGenerator;
use crate::config::DigestSettings;
use crate::error::SourceError;
use crate::models::{Digest, Item, Section, SourceKind};
use crate::scrapers::{SourceFetcher, SourceSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

pub const MODELS_TITLE: &str = "Models";
pub const NEWS_TITLE: &str = "News";
pub const PAPERS_TITLE: &str = "Papers";

/// Raw per-source results, before truncation.
#[derive(Debug, Default, Clone)]
pub struct Batches {
    pub models: Vec<Item>,
    pub site_news: Vec<Item>,
    pub web_search: Vec<Item>,
    pub search_news: Vec<Item>,
    pub papers: Vec<Item>,
}

/// Builds a [`Digest`] from a [`SourceSet`] and a closing-phrase generator.
pub struct Aggregator {
    sources: SourceSet,
    warm_phrase: Arc<dyn WarmPhraseGenerator>,
    title: String,
    fallback_phrase: String,
    top_n: usize,
}

impl Aggregator {
    /// Title, fallback phrase and top-N come from `settings`.
    pub fn new(
        sources: SourceSet,
        warm_phrase: Arc<dyn WarmPhraseGenerator>,
        settings: &DigestSettings,
    ) -> Self {
        Self {
            sources,
            warm_phrase,
            title: settings.title.clone(),
            fallback_phrase: settings.fallback_phrase.clone(),
            top_n: settings.top_n,
        }
    }

    /// Collect from every source and assemble the digest.
    ///
    /// Never fails: source and generation failures only shrink the digest or
    /// swap in the fallback phrase.
    #[instrument(level = "info", skip_all, fields(top_n = self.top_n))]
    pub async fn build(&self) -> Digest {
        let t0 = Instant::now();
        let (batches, closing_phrase) = tokio::join!(self.collect(), self.closing_phrase());
        let digest = assemble(&self.title, closing_phrase, batches, self.top_n);
        info!(
            sections = digest.sections.len(),
            items = digest.item_count(),
            elapsed_ms = t0.elapsed().as_millis(),
            "Digest assembled"
        );
        digest
    }

    /// Run all five sources concurrently and wait for every one of them.
    pub async fn collect(&self) -> Batches {
        let sources = &self.sources;
        let (models, site_news, web_search, search_news, papers) = tokio::join!(
            run_source(SourceKind::Models, Arc::clone(&sources.models)),
            run_source(SourceKind::SiteNews, Arc::clone(&sources.site_news)),
            run_source(SourceKind::WebSearch, Arc::clone(&sources.web_search)),
            run_source(SourceKind::SearchNews, Arc::clone(&sources.search_news)),
            run_source(SourceKind::Papers, Arc::clone(&sources.papers)),
        );

        Batches {
            models,
            site_news,
            web_search,
            search_news,
            papers,
        }
    }

    async fn closing_phrase(&self) -> String {
        let generator = Arc::clone(&self.warm_phrase);
        match tokio::spawn(async move { generator.generate().await }).await {
            Ok(Ok(phrase)) => phrase,
            Ok(Err(e)) => {
                warn!(error = %e, "Closing phrase generation failed; using fallback");
                self.fallback_phrase.clone()
            }
            Err(e) => {
                warn!(error = %e, "Closing phrase task aborted; using fallback");
                self.fallback_phrase.clone()
            }
        }
    }
}

/// Run one source in its own task, turning any failure into an empty batch.
async fn run_source(slot: SourceKind, source: Arc<dyn SourceFetcher>) -> Vec<Item> {
    let t0 = Instant::now();
    let outcome = match tokio::spawn(async move { source.fetch().await }).await {
        Ok(result) => result,
        Err(e) => Err(SourceError::Aborted(e.to_string())),
    };

    match outcome {
        Ok(items) => {
            info!(
                source = %slot,
                count = items.len(),
                elapsed_ms = t0.elapsed().as_millis(),
                "Source finished"
            );
            items
        }
        Err(e) => {
            warn!(source = %slot, error = %e, "Source failed; contributing nothing");
            Vec::new()
        }
    }
}

/// Keep the first `top_n` items of a batch.
fn take_prefix(mut items: Vec<Item>, top_n: usize) -> Vec<Item> {
    items.truncate(top_n);
    items
}

/// Group per-source batches into the fixed section layout.
pub fn assemble(title: &str, closing_phrase: String, batches: Batches, top_n: usize) -> Digest {
    let Batches {
        models,
        site_news,
        web_search,
        search_news,
        papers,
    } = batches;

    let news: Vec<Item> = [site_news, web_search, search_news]
        .into_iter()
        .flat_map(|batch| take_prefix(batch, top_n))
        .collect();

    let sections = [
        Section::non_empty(MODELS_TITLE, take_prefix(models, top_n)),
        Section::non_empty(NEWS_TITLE, news),
        Section::non_empty(PAPERS_TITLE, take_prefix(papers, top_n)),
    ]
    .into_iter()
    .flatten()
    .collect();

    Digest {
        title: title.to_string(),
        closing_phrase,
        sections,
    }
}

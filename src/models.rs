//! Data models for collected items and the digest built from them.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Item`]: One normalized model/news/paper entry produced by a scraper
//! - [`Section`]: A titled, ordered group of items from one source category
//! - [`Digest`]: The full artifact for one publishing cycle, consumed by the renderers
//! - [`SourceKind`]: Identifies which of the five scrapers produced a batch of items
//!
//! Items keep the order in which their scraper returned them. Nothing in this
//! module re-sorts or deduplicates.

use crate::error::DigestError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single normalized entry with a title, an absolute link and a blurb.
///
/// `text` is often identical to `title`. When it differs it is a translated
/// or condensed blurb, and renderers present both.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Item {
    /// The original headline or model/paper name.
    pub title: String,
    /// Absolute link to the item.
    pub url: String,
    /// Human-readable blurb shown as the link label.
    pub text: String,
}

impl Item {
    /// Create an item whose blurb is its own title.
    pub fn titled(title: impl Into<String>, url: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            text: title.clone(),
            title,
            url: url.into(),
        }
    }

    /// Create an item with a separate blurb.
    pub fn new(title: impl Into<String>, url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            text: text.into(),
        }
    }

    /// Whether the blurb differs from the title (translated or condensed).
    pub fn has_blurb(&self) -> bool {
        self.text != self.title
    }
}

/// A titled, ordered group of items.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Section {
    pub title: String,
    pub items: Vec<Item>,
}

impl Section {
    /// Build a section, returning `None` when there is nothing to show.
    ///
    /// Empty sections never appear in a [`Digest`], so callers use this to
    /// drop a category instead of emitting it empty.
    pub fn non_empty(title: impl Into<String>, items: Vec<Item>) -> Option<Self> {
        if items.is_empty() {
            None
        } else {
            Some(Self {
                title: title.into(),
                items,
            })
        }
    }
}

/// The aggregated artifact for one publishing cycle.
///
/// Section order is significant: whichever of Models, News and Papers are
/// non-empty appear in that order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Digest {
    /// Display title of the edition.
    pub title: String,
    /// One-line closing phrase, or the configured fallback.
    pub closing_phrase: String,
    /// Non-empty sections in display order.
    pub sections: Vec<Section>,
}

impl Digest {
    /// Check the invariants renderers rely on.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::EmptySection`] if any section has no items.
    pub fn validate(&self) -> Result<(), DigestError> {
        match self.sections.iter().find(|s| s.items.is_empty()) {
            Some(section) => Err(DigestError::EmptySection {
                title: section.title.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Total number of items across all sections.
    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }
}

/// The five collectors feeding a digest.
///
/// The three news variants are listed in the order their output is
/// concatenated into the News section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Models,
    SiteNews,
    WebSearch,
    SearchNews,
    Papers,
}

impl SourceKind {
    /// Short, stable name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Models => "models",
            SourceKind::SiteNews => "site_news",
            SourceKind::WebSearch => "web_search",
            SourceKind::SearchNews => "search_news",
            SourceKind::Papers => "papers",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

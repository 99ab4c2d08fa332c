//! Styled article body for the official-account draft.
//!
//! The digest is rendered as inline-styled HTML blocks: a header with the
//! digest title, one card per section, and a closing card with the closing
//! phrase. The editor that receives this body turns stray whitespace into
//! visible gaps, so the final output is flattened: every line is trimmed and
//! blank lines are dropped.
//!
//! # Link Presentation
//!
//! - **First-party** links (host in `digest.first_party_domains`) render as
//!   a plain linked label.
//! - **Other** links render as a linked label followed by a separate line
//!   with the raw URL, since the article viewer hides link targets.
//!
//! When an item's blurb differs from its title (a translated paper, for
//! example), the original title is shown under the label.

use crate::config::DigestSettings;
use crate::error::DigestError;
use crate::models::{Digest, Item, Section};
use crate::utils::{escape_html, host_in};
use tracing::{debug, instrument};

/// Renders a [`Digest`] into the styled article body.
#[derive(Debug, Clone)]
pub struct DocumentRenderer {
    first_party_domains: Vec<String>,
    promo: Option<Section>,
}

impl DocumentRenderer {
    /// Links on any of `first_party_domains` (or their subdomains) are
    /// rendered without a visible URL line. `promo` is placed before the
    /// digest sections on every render.
    pub fn new(first_party_domains: Vec<String>, promo: Option<Section>) -> Self {
        Self {
            first_party_domains,
            promo,
        }
    }

    /// Renderer for the configured domains and promo section.
    pub fn from_settings(settings: &DigestSettings) -> Self {
        let promo = settings
            .promo
            .clone()
            .and_then(|item| Section::non_empty(settings.promo_title.clone(), vec![item]));
        Self::new(settings.first_party_domains.clone(), promo)
    }

    /// Render the article body.
    ///
    /// The promotional section, when configured, is placed in front of the
    /// digest's own sections for this render only.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::EmptySection`] if the digest contains a section
    /// without items.
    #[instrument(level = "info", skip_all, fields(sections = digest.sections.len()))]
    pub fn render(&self, digest: &Digest) -> Result<String, DigestError> {
        digest.validate()?;

        let mut html = String::new();
        write_header(&mut html, &digest.title);
        for section in self.promo.iter().chain(digest.sections.iter()) {
            self.write_section(&mut html, section);
        }
        write_closing(&mut html, &digest.closing_phrase);

        let body = flatten(&html);
        debug!(bytes = body.len(), "Rendered document body");
        Ok(body)
    }

    fn is_first_party(&self, item: &Item) -> bool {
        host_in(&item.url, &self.first_party_domains)
    }

    fn write_section(&self, html: &mut String, section: &Section) {
        html.push_str(&format!(
            r#"
            <section style="margin: 15px 0; padding: 0; background: linear-gradient(to right, #ffffff 0%, #f8f9ff 100%); border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); border-left: 4px solid #667eea;">
                <h2 style="color: #667eea; font-size: 18px; font-weight: bold; margin: 0 0 10px 0; padding: 0; border-bottom: 2px solid #e8ebff;">
                    📌 {title}
                </h2>
                <ul style="margin: 0; padding: 0; list-style-type: none;">
            "#,
            title = escape_html(&section.title)
        ));
        for item in &section.items {
            self.write_item(html, item);
        }
        html.push_str(
            r#"
                </ul>
            </section>
            "#,
        );
    }

    fn write_item(&self, html: &mut String, item: &Item) {
        let url = escape_html(&item.url);
        html.push_str(&format!(
            r#"
            <li style="margin: 8px 0; padding: 0; color: #2c3e50; line-height: 1.8;">
                <a href="{url}" target="_blank" style="color: #5a67d8; text-decoration: none; font-weight: 500;">▸ {text}</a>
            "#,
            text = escape_html(&item.text)
        ));
        if item.has_blurb() {
            html.push_str(&format!(
                r#"
                <p style="margin: 0; color: #7f8c8d; font-size: 13px;">{title}</p>
                "#,
                title = escape_html(&item.title)
            ));
        }
        if !self.is_first_party(item) {
            html.push_str(&format!(
                r#"
                <p style="margin: 0; color: #a0aec0; font-size: 12px; word-break: break-all;">{url}</p>
                "#
            ));
        }
        html.push_str("\n</li>\n");
    }
}

fn write_header(html: &mut String, title: &str) {
    html.push_str(&format!(
        r#"
        <section style="padding: 0; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); border-radius: 8px; margin-bottom: 15px;">
            <h1 style="text-align: left; color: #ffffff; font-size: 24px; font-weight: bold; margin: 0; text-shadow: 2px 2px 4px rgba(0,0,0,0.2);">
                ✨ {title} ✨
            </h1>
        </section>
        "#,
        title = escape_html(title)
    ));
}

fn write_closing(html: &mut String, phrase: &str) {
    html.push_str(&format!(
        r#"
        <section style="margin-top: 15px; padding: 0; background: linear-gradient(135deg, #f093fb 0%, #f5576c 100%); border-radius: 8px; text-align: left; box-shadow: 0 2px 4px rgba(0,0,0,0.15);">
            <h1 style="color: #ffffff; font-size: 20px; font-weight: 600; margin: 0; text-shadow: 1px 1px 3px rgba(0,0,0,0.2); line-height: 1.6;">
                💖 {phrase} 💖
            </h1>
        </section>
        "#,
        phrase = escape_html(phrase)
    ));
}

/// Trim every line and drop the blank ones.
pub fn flatten(html: &str) -> String {
    html.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

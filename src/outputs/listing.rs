//! Listings of raw source results for the `spider` commands.
//!
//! # Formats
//!
//! - **Text**: a banner per category followed by numbered items. The blurb
//!   line is printed only when it differs from the title.
//! - **JSON**: a pretty-printed array of items, or an object mapping
//!   category to array when several categories are listed together.
//!
//! Listings can also be written to a file instead of stdout.

use crate::models::Item;
use serde::Serialize;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

const RULE_WIDTH: usize = 50;

/// Output format of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ListingFormat {
    Text,
    Json,
}

/// One named group of items in a listing.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub name: String,
    pub items: Vec<Item>,
}

impl Category {
    pub fn new(name: impl Into<String>, items: Vec<Item>) -> Self {
        Self {
            name: name.into(),
            items,
        }
    }
}

/// Render the text listing of one category.
pub fn format_text(category: &Category) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = format!("{rule}\n{} ({} items)\n{rule}\n", category.name, category.items.len());
    for (i, item) in category.items.iter().enumerate() {
        out.push_str(&format!("{}. {}\n   URL: {}\n", i + 1, item.title, item.url));
        if item.has_blurb() {
            out.push_str(&format!("   Blurb: {}\n", item.text));
        }
    }
    out
}

/// Render a listing of one or more categories.
///
/// A single category in JSON is emitted as a bare array.
pub fn render(categories: &[Category], format: ListingFormat) -> Result<String, serde_json::Error> {
    match format {
        ListingFormat::Text => Ok(categories
            .iter()
            .map(format_text)
            .collect::<Vec<_>>()
            .join("\n")),
        ListingFormat::Json => match categories {
            [only] => serde_json::to_string_pretty(&only.items),
            many => {
                let map: serde_json::Map<String, serde_json::Value> = many
                    .iter()
                    .map(|c| Ok((c.name.clone(), serde_json::to_value(&c.items)?)))
                    .collect::<Result<_, serde_json::Error>>()?;
                serde_json::to_string_pretty(&map)
            }
        },
    }
}

/// Write rendered output to `path`, creating parent directories.
#[instrument(level = "info", skip(content), fields(bytes = content.len()))]
pub async fn write_output(path: &Path, content: &str) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, content).await?;
    info!(path = %path.display(), "Wrote output");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn papers() -> Category {
        Category::new(
            "Papers",
            vec![
                Item::new("Bee", "https://arxiv.org/abs/1", "蜜蜂语料库"),
                Item::titled("VisCoP", "https://arxiv.org/abs/2"),
            ],
        )
    }

    #[test]
    fn test_text_listing_layout() {
        let text = format_text(&papers());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "=".repeat(50));
        assert_eq!(lines[1], "Papers (2 items)");
        assert_eq!(lines[2], "=".repeat(50));
        assert_eq!(lines[3], "1. Bee");
        assert_eq!(lines[4], "   URL: https://arxiv.org/abs/1");
        assert_eq!(lines[5], "   Blurb: 蜜蜂语料库");
        assert_eq!(lines[6], "2. VisCoP");
        assert_eq!(lines[7], "   URL: https://arxiv.org/abs/2");
        assert_eq!(lines.len(), 8);
        assert!(text.ends_with("   URL: https://arxiv.org/abs/2\n"));
    }

    #[test]
    fn test_json_single_category_is_array() {
        let json = render(&[papers()], ListingFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
        assert_eq!(value[0]["text"], "蜜蜂语料库");
        assert!(json.contains("蜜蜂语料库"));
    }

    #[test]
    fn test_json_many_categories_is_object() {
        let models = Category::new("Models", vec![Item::titled("m", "https://huggingface.co/m")]);
        let json = render(&[models, papers()], ListingFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["Models"][0]["url"], "https://huggingface.co/m");
        assert_eq!(value["Papers"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_empty_category_text() {
        let text = format_text(&Category::new("News", vec![]));
        assert!(text.contains("News (0 items)"));
        assert_eq!(text.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_write_output_creates_parents() {
        let dir = std::env::temp_dir().join(format!("digest-listing-{}", std::process::id()));
        let path = dir.join("nested").join("out.txt");
        write_output(&path, "hello").await.unwrap();
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "hello");
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}

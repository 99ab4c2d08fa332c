//! Utility functions for string handling and URL inspection.
//!
//! This module provides helper functions used throughout the application:
//! - String truncation for logging and for condensed blurbs
//! - Whitespace collapsing for single-line model output
//! - HTML escaping for the styled document
//! - Host matching for first-party link detection

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes, backing off to the nearest
/// character boundary, with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Keep the first `max` characters, appending `...` only when something was cut.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// Collapse every whitespace run (including newlines) into one space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s.trim(), " ").into_owned()
}

/// Escape text for inclusion in HTML element content or a quoted attribute.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Whether `url`'s host is one of `domains` or a subdomain of one.
///
/// Unparseable URLs never match.
pub fn host_in(url: &str, domains: &[String]) -> bool {
    let Some(host) = Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_ascii_lowercase))
    else {
        return false;
    };
    domains.iter().any(|d| {
        let d = d.trim_start_matches('.').to_ascii_lowercase();
        host == d || host.ends_with(&format!(".{d}"))
    })
}

/// Show only the start of a secret, for logs.
pub fn mask_secret(secret: &str) -> String {
    let head: String = secret.chars().take(6).collect();
    if head.len() == secret.len() {
        "***".to_string()
    } else {
        format!("{head}***")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundary() {
        // each character is three bytes
        let s = "模型模型";
        assert_eq!(truncate_for_log(s, 4), "模…(+9 bytes)");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 40), "short");
        assert_eq!(truncate_chars(&"x".repeat(40), 40), "x".repeat(40));
        assert_eq!(truncate_chars(&"x".repeat(41), 40), format!("{}...", "x".repeat(40)));
        assert_eq!(truncate_chars("视觉语言模型", 2), "视觉...");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(
            collapse_whitespace("  Stay hungry,\n stay foolish.\t--Jobs \n"),
            "Stay hungry, stay foolish. --Jobs"
        );
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
        assert_eq!(escape_html("模型"), "模型");
    }

    #[test]
    fn test_host_in() {
        let domains = vec!["ph8.co".to_string()];
        assert!(host_in("https://ph8.co", &domains));
        assert!(host_in("https://api.PH8.co/pricing", &domains));
        assert!(!host_in("https://notph8.co", &domains));
        assert!(!host_in("https://example.com/ph8.co", &domains));
        assert!(!host_in("not a url", &domains));
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("2ad85006-0d75"), "2ad850***");
        assert_eq!(mask_secret("abc"), "***");
    }
}

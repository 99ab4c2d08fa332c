//! Size-bounded markdown message for group-chat robots.
//!
//! Every item becomes one quoted line, `> {section}: [{text}]({url})`, and
//! lines are joined with `\n`. Before a line is appended, the UTF-8 byte
//! length of the body *with* that line is compared to the budget:
//!
//! - if it fits, the line is appended;
//! - if it does not, the rest of the **current section** is skipped, and
//!   rendering carries on with the next section under the same budget.
//!
//! A later, shorter line can therefore still land after an earlier section
//! was cut short. Lines are never split, so the body never ends in a partial
//! code point.

use crate::error::DigestError;
use crate::models::Digest;
use tracing::{debug, instrument};

/// Default robot message ceiling, in bytes.
pub const DEFAULT_BUDGET_BYTES: usize = 3400;

/// Render the budgeted message body.
///
/// # Arguments
///
/// * `digest` - The digest to render. Its title and closing phrase are not
///   part of the message.
/// * `budget_bytes` - Upper bound on the body length checked before each
///   append.
///
/// # Errors
///
/// Returns [`DigestError::EmptySection`] if the digest contains a section
/// without items.
#[instrument(level = "info", skip(digest), fields(sections = digest.sections.len()))]
pub fn render(digest: &Digest, budget_bytes: usize) -> Result<String, DigestError> {
    digest.validate()?;

    let mut body = String::new();
    for section in &digest.sections {
        for item in &section.items {
            let line = format!("> {}: [{}]({})", section.title, item.text, item.url);
            let separator = if body.is_empty() { 0 } else { 1 };
            if body.len() + separator + line.len() > budget_bytes {
                debug!(
                    section = %section.title,
                    used = body.len(),
                    "Budget reached; skipping rest of section"
                );
                break;
            }
            if separator == 1 {
                body.push('\n');
            }
            body.push_str(&line);
        }
    }
    Ok(body)
}

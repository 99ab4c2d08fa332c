//! Output formats for a collected digest.
//!
//! # Submodules
//!
//! - [`document`]: Styled article body for the official-account draft
//! - [`message`]: Byte-budgeted markdown message for chat robots
//! - [`listing`]: Text and JSON listings of raw source results

pub mod document;
pub mod listing;
pub mod message;

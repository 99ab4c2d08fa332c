//! Publishing a rendered digest to its destinations.
//!
//! # Publishers
//!
//! - [`wechat::WechatDraftPublisher`]: Creates an official-account draft from
//!   the styled document body
//! - [`wxwork::RobotPublisher`]: Posts the budgeted markdown message to every
//!   configured group-chat robot
//!
//! A publisher may address several destinations. A failure on one is logged
//! and recorded in the [`PublishReport`]; the remaining destinations are
//! still attempted.

pub mod wechat;
pub mod wxwork;

use crate::error::PublishError;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{error, info};

/// Trait for digest sinks.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Publish `body`. Variants that have no notion of a title or author only
    /// log them.
    async fn publish(&self, body: &str, title: &str, author: &str)
    -> Result<PublishReport, PublishError>;
}

/// What happened at one destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationOutcome {
    Delivered {
        destination: String,
        id: Option<String>,
    },
    Failed {
        destination: String,
        error: String,
    },
}

/// Per-destination outcomes of one publish call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub publisher: &'static str,
    pub outcomes: Vec<DestinationOutcome>,
}

impl PublishReport {
    pub fn new(publisher: &'static str) -> Self {
        Self {
            publisher,
            outcomes: Vec::new(),
        }
    }

    pub fn delivered(&mut self, destination: impl Into<String>, id: Option<String>) {
        self.outcomes.push(DestinationOutcome::Delivered {
            destination: destination.into(),
            id,
        });
    }

    pub fn failed(&mut self, destination: impl Into<String>, error: impl ToString) {
        self.outcomes.push(DestinationOutcome::Failed {
            destination: destination.into(),
            error: error.to_string(),
        });
    }

    pub fn delivered_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, DestinationOutcome::Delivered { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.delivered_count()
    }

    /// Log one line per destination.
    pub fn log(&self) {
        for outcome in &self.outcomes {
            match outcome {
                DestinationOutcome::Delivered { destination, id } => info!(
                    publisher = self.publisher,
                    %destination,
                    id = id.as_deref().unwrap_or("-"),
                    "Delivered"
                ),
                DestinationOutcome::Failed { destination, error } => error!(
                    publisher = self.publisher,
                    %destination,
                    %error,
                    "Delivery failed"
                ),
            }
        }
    }
}

/// Reply envelope shared by the official-account and robot APIs.
///
/// A missing `errcode` means success.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct PlatformReply {
    #[serde(default)]
    pub errcode: i64,
    #[serde(default)]
    pub errmsg: String,
    #[serde(default)]
    pub media_id: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
}

impl PlatformReply {
    pub fn into_result(self) -> Result<Self, PublishError> {
        if self.errcode == 0 {
            Ok(self)
        } else {
            Err(PublishError::Api {
                errcode: self.errcode,
                errmsg: self.errmsg,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let mut report = PublishReport::new("robot");
        report.delivered("key-a", None);
        report.failed("key-b", "boom");
        report.delivered("key-c", Some("1".to_string()));
        assert_eq!(report.delivered_count(), 2);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(
            report.outcomes[1],
            DestinationOutcome::Failed {
                destination: "key-b".to_string(),
                error: "boom".to_string()
            }
        );
    }

    #[test]
    fn test_platform_reply_errcode() {
        let ok: PlatformReply = serde_json::from_str(r#"{"media_id":"m1"}"#).unwrap();
        assert_eq!(ok.into_result().unwrap().media_id.as_deref(), Some("m1"));

        let bad: PlatformReply =
            serde_json::from_str(r#"{"errcode":40001,"errmsg":"invalid credential"}"#).unwrap();
        assert!(matches!(
            bad.into_result(),
            Err(PublishError::Api { errcode: 40001, .. })
        ));
    }
}

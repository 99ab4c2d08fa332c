//! Group-chat robot publisher.
//!
//! Sends the budgeted markdown message to every configured robot key in
//! turn. Robot messages carry no title or author, so those are only logged.

use crate::config::WxworkConfig;
use crate::error::PublishError;
use crate::publish::{PlatformReply, PublishReport, Publisher};
use crate::utils::mask_secret;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, instrument, warn};

#[derive(Debug, Serialize)]
struct MarkdownMessage<'a> {
    msgtype: &'static str,
    markdown: MarkdownContent<'a>,
}

#[derive(Debug, Serialize)]
struct MarkdownContent<'a> {
    content: &'a str,
}

/// Posts a markdown message to each group-chat robot webhook key.
pub struct RobotPublisher {
    client: reqwest::Client,
    webhook_url: String,
    keys: Vec<String>,
}

impl RobotPublisher {
    /// Create a robot publisher.
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client.
    /// * `config` - Webhook URL and robot keys. Keys are trimmed and blank
    ///   ones dropped.
    pub fn new(client: reqwest::Client, config: &WxworkConfig) -> Self {
        Self {
            client,
            webhook_url: config.webhook_url.clone(),
            keys: config
                .robot_keys
                .iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    async fn send(&self, key: &str, body: &str) -> Result<(), PublishError> {
        let message = MarkdownMessage {
            msgtype: "markdown",
            markdown: MarkdownContent { content: body },
        };
        let reply: PlatformReply = self
            .client
            .post(&self.webhook_url)
            .query(&[("key", key)])
            .json(&message)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        reply.into_result().map(|_| ())
    }
}

#[async_trait]
impl Publisher for RobotPublisher {
    fn name(&self) -> &'static str {
        "wxwork"
    }

    /// Attempt every key; one failing key never stops the others.
    ///
    /// # Errors
    ///
    /// [`PublishError::NotConfigured`] without keys, and
    /// [`PublishError::AllFailed`] when no key accepted the message.
    #[instrument(level = "info", skip(self, body), fields(keys = self.keys.len(), bytes = body.len()))]
    async fn publish(
        &self,
        body: &str,
        title: &str,
        author: &str,
    ) -> Result<PublishReport, PublishError> {
        if self.keys.is_empty() {
            return Err(PublishError::NotConfigured("WEIXIN_ROBOT_KEYS".to_string()));
        }

        let mut report = PublishReport::new(self.name());
        for key in &self.keys {
            let masked = mask_secret(key);
            match self.send(key, body).await {
                Ok(()) => {
                    info!(key = %masked, "Robot message sent");
                    report.delivered(masked, None);
                }
                Err(e) => {
                    warn!(key = %masked, error = %e, "Robot message failed");
                    report.failed(masked, e);
                }
            }
        }

        if report.delivered_count() == 0 {
            return Err(PublishError::AllFailed {
                attempted: report.outcomes.len(),
            });
        }
        Ok(report)
    }
}

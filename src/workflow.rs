//! The daily run and its scheduler.
//!
//! A daily run builds one digest, renders it once per enabled publisher
//! with that publisher's renderer, and publishes. Publisher failures are
//! logged and reported; they never abort the run.

use crate::aggregator::Aggregator;
use crate::config::DigestSettings;
use crate::error::WorkflowError;
use crate::outputs::{document::DocumentRenderer, message};
use crate::publish::{PublishReport, Publisher};
use chrono::{DateTime, Duration, Local, NaiveTime, TimeZone};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{error, info, instrument};

/// Publishers enabled for a run.
#[derive(Clone, Default)]
pub struct Targets {
    /// Receives the styled document body.
    pub document: Option<Arc<dyn Publisher>>,
    /// Receives the budgeted message body.
    pub message: Option<Arc<dyn Publisher>>,
}

impl Targets {
    pub fn is_empty(&self) -> bool {
        self.document.is_none() && self.message.is_none()
    }
}

pub struct Workflow {
    aggregator: Aggregator,
    document: DocumentRenderer,
    budget_bytes: usize,
    targets: Targets,
}

impl Workflow {
    pub fn new(aggregator: Aggregator, settings: &DigestSettings, targets: Targets) -> Self {
        Self {
            aggregator,
            document: DocumentRenderer::from_settings(settings),
            budget_bytes: settings.message_budget_bytes,
            targets,
        }
    }

    /// Build, render and publish one digest.
    ///
    /// # Returns
    ///
    /// One report per publisher that accepted at least one delivery.
    ///
    /// # Errors
    ///
    /// [`WorkflowError::NoPublisher`] before anything is fetched when no
    /// publisher is enabled, or [`WorkflowError::Digest`] when the digest
    /// breaks a renderer invariant.
    #[instrument(level = "info", skip(self))]
    pub async fn daily(&self, title: &str, author: &str) -> Result<Vec<PublishReport>, WorkflowError> {
        if self.targets.is_empty() {
            return Err(WorkflowError::NoPublisher);
        }

        let digest = self.aggregator.build().await;
        let mut reports = Vec::new();

        if let Some(publisher) = &self.targets.document {
            let body = self.document.render(&digest)?;
            reports.extend(publish_logged(publisher.as_ref(), &body, title, author).await);
        }
        if let Some(publisher) = &self.targets.message {
            let body = message::render(&digest, self.budget_bytes)?;
            reports.extend(publish_logged(publisher.as_ref(), &body, title, author).await);
        }

        info!(reports = reports.len(), "Daily run finished");
        Ok(reports)
    }

    /// Run [`Workflow::daily`] every day at `at` local time. Only returns if
    /// no publisher is enabled.
    pub async fn schedule(&self, at: NaiveTime, title: &str, author: &str) -> Result<(), WorkflowError> {
        if self.targets.is_empty() {
            return Err(WorkflowError::NoPublisher);
        }
        loop {
            let now = Local::now();
            let next = next_run(&now, at);
            info!(next_run = %next.to_rfc3339(), "Waiting for next daily run");
            sleep((next - now).to_std().unwrap_or_default()).await;

            if let Err(e) = self.daily(title, author).await {
                error!(error = %e, "Daily run failed");
            }
        }
    }
}

async fn publish_logged(
    publisher: &dyn Publisher,
    body: &str,
    title: &str,
    author: &str,
) -> Option<PublishReport> {
    match publisher.publish(body, title, author).await {
        Ok(report) => {
            report.log();
            Some(report)
        }
        Err(e) => {
            error!(publisher = publisher.name(), error = %e, "Publishing failed");
            None
        }
    }
}

/// The first occurrence of `at` strictly after `now`.
pub fn next_run<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> DateTime<Tz> {
    let today = now.date_naive().and_time(at);
    let candidate = if today > now.naive_local() {
        today
    } else {
        today + Duration::days(1)
    };
    now.timezone()
        .from_local_datetime(&candidate)
        .earliest()
        .unwrap_or_else(|| now.clone() + Duration::days(1))
}

/// Parse an `HH:MM` time of day.
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|e| format!("expected HH:MM, got `{s}`: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::WarmPhraseGenerator;
    use crate::error::{GenerationError, PublishError, SourceError};
    use crate::models::{Item, SourceKind};
    use crate::scrapers::{SourceFetcher, SourceSet};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counted {
        kind: SourceKind,
        items: Vec<Item>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SourceFetcher for Counted {
        fn kind(&self) -> SourceKind {
            self.kind
        }

        async fn fetch(&self) -> Result<Vec<Item>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.items.clone())
        }
    }

    struct Phrase;

    #[async_trait]
    impl WarmPhraseGenerator for Phrase {
        async fn generate(&self) -> Result<String, GenerationError> {
            Ok("Stay curious. --Einstein".to_string())
        }
    }

    #[derive(Default)]
    struct Recorder {
        bodies: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl Publisher for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        async fn publish(
            &self,
            body: &str,
            title: &str,
            _author: &str,
        ) -> Result<PublishReport, PublishError> {
            self.bodies
                .lock()
                .unwrap()
                .push((body.to_string(), title.to_string()));
            if self.fail {
                return Err(PublishError::AllFailed { attempted: 1 });
            }
            let mut report = PublishReport::new(self.name());
            report.delivered("memory", None);
            Ok(report)
        }
    }

    fn workflow(targets: Targets, calls: Arc<AtomicUsize>) -> Workflow {
        let source = |kind: SourceKind, items: Vec<Item>| -> Arc<dyn SourceFetcher> {
            Arc::new(Counted {
                kind,
                items,
                calls: Arc::clone(&calls),
            })
        };
        let sources = SourceSet {
            models: source(SourceKind::Models, vec![]),
            site_news: source(SourceKind::SiteNews, vec![Item::titled("A", "http://x")]),
            web_search: source(SourceKind::WebSearch, vec![]),
            search_news: source(SourceKind::SearchNews, vec![]),
            papers: source(SourceKind::Papers, vec![]),
        };
        let settings = DigestSettings::default();
        let aggregator = Aggregator::new(sources, Arc::new(Phrase), &settings);
        Workflow::new(aggregator, &settings, targets)
    }

    #[tokio::test]
    async fn test_no_publisher_fails_before_fetching() {
        let calls = Arc::new(AtomicUsize::new(0));
        let err = workflow(Targets::default(), Arc::clone(&calls))
            .daily("t", "a")
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NoPublisher));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_each_publisher_gets_its_rendering() {
        let document = Arc::new(Recorder::default());
        let robot = Arc::new(Recorder::default());
        let targets = Targets {
            document: Some(document.clone() as Arc<dyn Publisher>),
            message: Some(robot.clone() as Arc<dyn Publisher>),
        };
        let calls = Arc::new(AtomicUsize::new(0));
        let reports = workflow(targets, Arc::clone(&calls))
            .daily("每日AI资讯精华", "AI小助手")
            .await
            .unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 5);

        let doc = document.bodies.lock().unwrap();
        assert!(doc[0].0.contains("📌 News"));
        assert!(doc[0].0.contains("💖 Stay curious. --Einstein 💖"));
        assert_eq!(doc[0].1, "每日AI资讯精华");

        let msg = robot.bodies.lock().unwrap();
        assert_eq!(msg[0].0, "> News: [A](http://x)");
    }

    #[tokio::test]
    async fn test_failing_publisher_does_not_stop_the_other() {
        let document = Arc::new(Recorder {
            fail: true,
            ..Recorder::default()
        });
        let robot = Arc::new(Recorder::default());
        let targets = Targets {
            document: Some(document.clone() as Arc<dyn Publisher>),
            message: Some(robot.clone() as Arc<dyn Publisher>),
        };
        let reports = workflow(targets, Arc::new(AtomicUsize::new(0)))
            .daily("t", "a")
            .await
            .unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(robot.bodies.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_next_run_later_today() {
        let now = Utc.with_ymd_and_hms(2025, 10, 16, 8, 30, 0).unwrap();
        let at = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert_eq!(next_run(&now, at), Utc.with_ymd_and_hms(2025, 10, 16, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_next_run_tomorrow_when_passed_or_equal() {
        let at = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 10, 16, 9, 0, 0).unwrap();
        assert_eq!(next_run(&now, at), Utc.with_ymd_and_hms(2025, 10, 17, 9, 0, 0).unwrap());
        let late = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 0).unwrap();
        assert_eq!(next_run(&late, at), Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(
            parse_time_of_day("09:00").unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap()
        );
        assert!(parse_time_of_day("25:00").is_err());
        assert!(parse_time_of_day("nine").is_err());
    }
}

//! # Daily AI Digest
//!
//! Collects the day's AI papers, models and news from five sources, groups
//! them into a digest, and publishes it as an official-account draft and as
//! a group-chat robot message.
//!
//! ## Features
//!
//! - Scrapes a paper hub, a model hub, a daily news page, a web search and a
//!   search-engine news API
//! - Translates paper titles and writes a closing phrase through an
//!   OpenAI-compatible LLM API
//! - Renders a styled article body and a byte-budgeted markdown message
//! - Publishes to official-account drafts and to any number of chat robots
//!
//! ## Usage
//!
//! ```sh
//! daily_ai_digest workflow daily --publish-wechat --publish-wxwork
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Collection**: All five scrapers run concurrently; a failing one only
//!    empties its slot
//! 2. **Assembly**: Each source is cut to its first `top_n` items and grouped
//!    into the Models, News and Papers sections
//! 3. **Rendering**: One rendering per destination
//! 4. **Publishing**: Every destination is attempted; failures are reported

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod aggregator;
mod api;
mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod publish;
mod scrapers;
mod utils;
mod workflow;

use aggregator::{Aggregator, MODELS_TITLE, NEWS_TITLE, PAPERS_TITLE};
use api::{
    ChatCompletion, LlmTranslator, LlmWarmPhrase, OpenAiChat, RetryAsk, Translator,
    WarmPhraseGenerator,
};
use cli::{
    ArticleExtras, Cli, Command, DailyArgs, NewsSource, RenderCommand, SpiderCommand,
    WechatCommand, WorkflowCommand,
};
use config::Config;
use models::Item;
use outputs::document::DocumentRenderer;
use outputs::listing::{self, Category};
use outputs::message;
use publish::wechat::{DraftArticle, WechatDraftPublisher};
use publish::wxwork::RobotPublisher;
use scrapers::{SourceFetcher, SourceSet};
use workflow::{Targets, Workflow};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = Instant::now();
    info!("daily_ai_digest starting up");

    let args = Cli::parse();
    debug!(config = ?args.config, command = ?args.command, "Parsed CLI arguments");

    let config = Config::load(args.config.as_deref())?.apply(args.keys.into_overrides());
    config.validate()?;
    let client = config.http_client()?;

    // One retrying chat client shared by every LLM-backed capability.
    let chat = Arc::new(RetryAsk::new(
        OpenAiChat::new(client.clone(), config.llm.clone()),
        config.llm.max_retries,
        Duration::from_secs(1),
    ));
    let warm_phrase: Arc<dyn WarmPhraseGenerator> = Arc::new(LlmWarmPhrase::new(Arc::clone(&chat)));
    let translator: Arc<dyn Translator> = Arc::new(LlmTranslator::new(Arc::clone(&chat)));
    let sources = SourceSet::from_config(&config, client.clone(), translator);

    match args.command {
        Command::Spider { target } => run_spider(target, &sources, warm_phrase.as_ref()).await?,
        Command::Render { target } => {
            let aggregator = Aggregator::new(sources, warm_phrase, &config.digest);
            run_render(target, &aggregator, &config).await?
        }
        Command::Wechat { action } => run_wechat(action, client, chat.as_ref(), &config).await?,
        Command::Workflow { action } => {
            let aggregator = Aggregator::new(sources, warm_phrase, &config.digest);
            run_workflow(action, aggregator, client, &config).await?
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

/// Fetch every source in order, skipping the ones that fail.
async fn fetch_tolerant(sources: &[&Arc<dyn SourceFetcher>]) -> Vec<Item> {
    let mut items = Vec::new();
    for source in sources {
        match source.fetch().await {
            Ok(batch) => items.extend(batch),
            Err(e) => warn!(source = %source.kind(), error = %e, "Source failed; skipping"),
        }
    }
    items
}

#[instrument(level = "info", skip_all)]
async fn run_spider(
    target: SpiderCommand,
    sources: &SourceSet,
    warm_phrase: &dyn WarmPhraseGenerator,
) -> Result<(), Box<dyn Error>> {
    let (categories, args) = match target {
        SpiderCommand::Papers(args) => {
            (vec![Category::new(PAPERS_TITLE, sources.papers.fetch().await?)], args)
        }
        SpiderCommand::Models(args) => {
            (vec![Category::new(MODELS_TITLE, sources.models.fetch().await?)], args)
        }
        SpiderCommand::News { source, listing } => {
            let items = match source {
                NewsSource::Site => sources.site_news.fetch().await?,
                NewsSource::Web => sources.web_search.fetch().await?,
                NewsSource::Search => sources.search_news.fetch().await?,
                NewsSource::All => {
                    fetch_tolerant(&[&sources.site_news, &sources.web_search, &sources.search_news])
                        .await
                }
            };
            (vec![Category::new(NEWS_TITLE, items)], listing)
        }
        SpiderCommand::All(args) => {
            let papers = fetch_tolerant(&[&sources.papers]).await;
            let models = fetch_tolerant(&[&sources.models]).await;
            let news =
                fetch_tolerant(&[&sources.site_news, &sources.web_search, &sources.search_news])
                    .await;
            let categories = vec![
                Category::new(PAPERS_TITLE, papers),
                Category::new(MODELS_TITLE, models),
                Category::new(NEWS_TITLE, news),
            ];
            (categories, args)
        }
        SpiderCommand::WarmWords => {
            let phrase = warm_phrase.generate().await?;
            println!("{phrase}");
            return Ok(());
        }
    };

    let rendered = listing::render(&categories, args.format)?;
    emit(&rendered, args.output.as_deref()).await
}

async fn run_render(
    target: RenderCommand,
    aggregator: &Aggregator,
    config: &Config,
) -> Result<(), Box<dyn Error>> {
    let digest = aggregator.build().await;
    let (body, output) = match target {
        RenderCommand::Document(args) => {
            let renderer = DocumentRenderer::from_settings(&config.digest);
            (renderer.render(&digest)?, args.output)
        }
        RenderCommand::Message(args) => (
            message::render(&digest, config.digest.message_budget_bytes)?,
            args.output,
        ),
    };
    emit(&body, output.as_deref()).await
}

fn article(title: String, author: String, content: String, extras: ArticleExtras) -> DraftArticle {
    DraftArticle {
        title,
        author,
        content,
        digest: extras.digest_text,
        content_source_url: extras.source_url,
        thumb: extras.thumb_image,
    }
}

#[instrument(level = "info", skip_all)]
async fn run_wechat(
    action: WechatCommand,
    client: reqwest::Client,
    chat: &dyn ChatCompletion,
    config: &Config,
) -> Result<(), Box<dyn Error>> {
    let publisher = WechatDraftPublisher::new(client, config.wechat.clone());
    let media_id = match action {
        WechatCommand::Draft(args) => {
            let content = tokio::fs::read_to_string(&args.content_file).await?;
            publisher
                .create_draft(&article(args.title, args.author, content, args.extras))
                .await?
        }
        WechatCommand::Publish(args) => {
            let content = tokio::fs::read_to_string(&args.content_file).await?;
            publisher
                .publish_permanent(&article(args.title, args.author, content, args.extras))
                .await?
        }
        WechatCommand::Generate(args) => {
            let raw = tokio::fs::read_to_string(&args.content_file).await?;
            let draft = article(args.title, args.author, String::new(), args.extras);
            publisher.generate(chat, &raw, draft).await?
        }
        WechatCommand::Upload(args) => {
            publisher
                .upload_image(&args.image_path, !args.temporary)
                .await?
        }
    };
    println!("{media_id}");
    Ok(())
}

async fn run_workflow(
    action: WorkflowCommand,
    aggregator: Aggregator,
    client: reqwest::Client,
    config: &Config,
) -> Result<(), Box<dyn Error>> {
    let (daily, at) = match action {
        WorkflowCommand::Daily(daily) => (daily, None),
        WorkflowCommand::Schedule { at, daily } => (daily, Some(at)),
    };
    let DailyArgs {
        title,
        author,
        publish_wechat,
        publish_wxwork,
    } = daily;

    let targets = Targets {
        document: publish_wechat.then(|| {
            Arc::new(WechatDraftPublisher::new(client.clone(), config.wechat.clone()))
                as Arc<dyn publish::Publisher>
        }),
        message: publish_wxwork.then(|| {
            Arc::new(RobotPublisher::new(client.clone(), &config.wxwork)) as Arc<dyn publish::Publisher>
        }),
    };
    let title = title.unwrap_or_else(|| config.digest.title.clone());
    let workflow = Workflow::new(aggregator, &config.digest, targets);

    match at {
        None => {
            info!(date = %Local::now().date_naive(), "Running daily workflow");
            let reports = workflow.daily(&title, &author).await?;
            for report in &reports {
                info!(
                    publisher = report.publisher,
                    delivered = report.delivered_count(),
                    failed = report.failed_count(),
                    "Publish summary"
                );
            }
        }
        Some(at) => workflow.schedule(at, &title, &author).await?,
    }
    Ok(())
}

/// Print to stdout, or write to `output` when given.
async fn emit(content: &str, output: Option<&Path>) -> Result<(), Box<dyn Error>> {
    match output {
        Some(path) => listing::write_output(path, content).await,
        None => {
            println!("{content}");
            Ok(())
        }
    }
}

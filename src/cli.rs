//! Command-line interface definitions for the digest tool.
//!
//! Commands are grouped the way the pipeline is: `spider` lists raw source
//! results, `render` prints a rendered digest, `wechat` drives the
//! official account by hand (drafts, permanent articles, generated articles
//! and image uploads), and `workflow` runs (or schedules) the full daily
//! pipeline.
//!
//! Credentials can be provided via command-line flags or environment
//! variables and take precedence over the YAML config file.

use crate::config::Overrides;
use crate::outputs::listing::ListingFormat;
use crate::workflow::parse_time_of_day;
use chrono::NaiveTime;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments for the digest tool.
///
/// # Examples
///
/// ```sh
/// # List today's papers
/// daily_ai_digest spider papers
///
/// # News from the web search only, as JSON
/// daily_ai_digest spider news --source web --format json
///
/// # Build, render and publish to both destinations
/// daily_ai_digest workflow daily --publish-wechat --publish-wxwork
///
/// # Same, every day at 09:00
/// daily_ai_digest workflow schedule --at 09:00 --publish-wxwork
///
/// # Upload a cover, then draft an LLM-formatted article with it
/// daily_ai_digest wechat upload --image-path cover.png
/// daily_ai_digest wechat generate --content-file today.txt --thumb-image cover.png
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to config.yaml file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(flatten)]
    pub keys: KeyArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Credentials and endpoints that override the config file.
#[derive(Args, Debug, Default)]
pub struct KeyArgs {
    /// API key for the chat-completion endpoint
    #[arg(long, env = "OPENAI_API_KEY", global = true, hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", global = true)]
    pub openai_base_url: Option<String>,

    /// Chat model name
    #[arg(long, env = "OPENAI_MODEL", global = true)]
    pub openai_model: Option<String>,

    /// SerpAPI key for search-engine news
    #[arg(long, env = "SERPAPI_KEY", global = true, hide_env_values = true)]
    pub serpapi_key: Option<String>,

    /// Comma-separated group-chat robot keys
    #[arg(long, env = "WEIXIN_ROBOT_KEYS", global = true, hide_env_values = true)]
    pub robot_keys: Option<String>,

    /// Official-account app id
    #[arg(long, env = "WECHAT_APP_ID", global = true)]
    pub wechat_app_id: Option<String>,

    /// Official-account app secret
    #[arg(long, env = "WECHAT_APP_SECRET", global = true, hide_env_values = true)]
    pub wechat_app_secret: Option<String>,

    /// Default cover image media id for drafts
    #[arg(long, env = "WECHAT_MEDIA_ID", global = true)]
    pub wechat_media_id: Option<String>,
}

impl KeyArgs {
    pub fn into_overrides(self) -> Overrides {
        Overrides {
            openai_api_key: self.openai_api_key,
            openai_base_url: self.openai_base_url,
            openai_model: self.openai_model,
            serpapi_key: self.serpapi_key,
            robot_keys: self.robot_keys,
            wechat_app_id: self.wechat_app_id,
            wechat_app_secret: self.wechat_app_secret,
            wechat_media_id: self.wechat_media_id,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List raw results of one or more sources
    Spider {
        #[command(subcommand)]
        target: SpiderCommand,
    },
    /// Build a digest and print one rendering of it
    Render {
        #[command(subcommand)]
        target: RenderCommand,
    },
    /// Official-account operations
    Wechat {
        #[command(subcommand)]
        action: WechatCommand,
    },
    /// Full pipeline: collect, render, publish
    Workflow {
        #[command(subcommand)]
        action: WorkflowCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum SpiderCommand {
    /// Newest papers with translated blurbs
    Papers(ListingArgs),
    /// Newest models from the model hub
    Models(ListingArgs),
    /// AI news from the news sources
    News {
        /// Which news source to query
        #[arg(long, value_enum, default_value_t = NewsSource::All)]
        source: NewsSource,

        #[command(flatten)]
        listing: ListingArgs,
    },
    /// Papers, models and news together
    All(ListingArgs),
    /// Generate one closing phrase
    WarmWords,
}

#[derive(Args, Debug)]
pub struct ListingArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = ListingFormat::Text)]
    pub format: ListingFormat,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsSource {
    All,
    Site,
    Web,
    Search,
}

#[derive(Subcommand, Debug)]
pub enum RenderCommand {
    /// Styled article body
    Document(RenderArgs),
    /// Byte-budgeted robot message
    Message(RenderArgs),
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum WechatCommand {
    /// Create a draft from an HTML file
    Draft(DraftArgs),
    /// Create a permanent article from an HTML file, without a draft
    Publish(DraftArgs),
    /// Lay out a plain-text file as HTML with the LLM, then draft it
    Generate(GenerateArgs),
    /// Upload an image and print its media id
    Upload(UploadArgs),
}

#[derive(Args, Debug)]
pub struct DraftArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub author: String,

    /// HTML file holding the article body
    #[arg(long)]
    pub content_file: PathBuf,

    #[command(flatten)]
    pub extras: ArticleExtras,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Plain-text file to lay out
    #[arg(long)]
    pub content_file: PathBuf,

    #[arg(long, default_value = "每日AI资讯精华")]
    pub title: String,

    #[arg(long, default_value = "AI小助手")]
    pub author: String,

    #[command(flatten)]
    pub extras: ArticleExtras,
}

/// Optional article fields shared by the article-creating subcommands.
#[derive(Args, Debug)]
pub struct ArticleExtras {
    /// Cover: a media id or a local .jpg/.jpeg/.png/.gif/.bmp path to upload;
    /// defaults to the configured one
    #[arg(long, alias = "thumb-media-id")]
    pub thumb_image: Option<String>,

    /// Summary shown in the article card
    #[arg(long, default_value = "")]
    pub digest_text: String,

    /// "Read more" link
    #[arg(long, default_value = "")]
    pub source_url: String,
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    #[arg(long)]
    pub image_path: PathBuf,

    /// Upload as temporary media instead of permanent material
    #[arg(long)]
    pub temporary: bool,
}

#[derive(Subcommand, Debug)]
pub enum WorkflowCommand {
    /// Run the pipeline once
    Daily(DailyArgs),
    /// Run the pipeline every day at a fixed local time
    Schedule {
        /// Local time of day, HH:MM
        #[arg(long, value_parser = parse_time_of_day, default_value = "09:00")]
        at: NaiveTime,

        #[command(flatten)]
        daily: DailyArgs,
    },
}

#[derive(Args, Debug)]
pub struct DailyArgs {
    /// Article title; defaults to the digest title
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long, default_value = "AI小助手")]
    pub author: String,

    /// Create an official-account draft
    #[arg(long)]
    pub publish_wechat: bool,

    /// Send the robot message
    #[arg(long)]
    pub publish_wxwork: bool,
}

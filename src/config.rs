//! Runtime configuration.
//!
//! A [`Config`] is assembled once at startup from an optional YAML file plus
//! command-line/environment overrides, then shared read-only with every
//! scraper, generator, renderer and publisher. Every field has a default, so
//! an empty or missing file is valid.
//!
//! ```yaml
//! llm:
//!   base_url: https://api.openai.com/v1
//!   model: gpt-4o-mini
//! wxwork:
//!   robot_keys: [key-one, key-two]
//! digest:
//!   top_n: 5
//!   message_budget_bytes: 3400
//! ```

use crate::error::ConfigError;
use crate::models::Item;
use crate::outputs::message::DEFAULT_BUDGET_BYTES;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub sources: SourceUrls,
    pub wechat: WechatConfig,
    pub wxwork: WxworkConfig,
    pub digest: DigestSettings,
    pub http: HttpConfig,
}

/// OpenAI-compatible chat-completion endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Retries inside the language-model client only.
    pub max_retries: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 1024,
            temperature: 0.7,
            max_retries: 3,
        }
    }
}

/// Queries and keys for the two search-backed news scrapers.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub serpapi_key: Option<String>,
    pub web_query: String,
    pub news_query: String,
    pub web_max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            serpapi_key: None,
            web_query: "大模型新闻事件 绘图模型新闻事件 ai新闻事件 芯片新闻事件".to_string(),
            news_query: "ai 芯片 大模型".to_string(),
            web_max_results: 10,
        }
    }
}

/// Endpoints of the five scrapers.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceUrls {
    pub papers_url: String,
    pub models_url: String,
    pub models_link_base: String,
    pub site_news_url: String,
    pub web_search_url: String,
    pub search_news_url: String,
}

impl Default for SourceUrls {
    fn default() -> Self {
        Self {
            papers_url: "https://hub-api.baai.ac.cn/api/v3/paper/list".to_string(),
            models_url: "https://hf-mirror.com/models".to_string(),
            models_link_base: "https://huggingface.co".to_string(),
            site_news_url: "https://ai-bot.cn/daily-ai-news/".to_string(),
            web_search_url: "https://html.duckduckgo.com/html/".to_string(),
            search_news_url: "https://serpapi.com/search.json".to_string(),
        }
    }
}

/// Official-account draft publishing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WechatConfig {
    pub app_id: String,
    pub app_secret: String,
    /// Cover image used when a draft is created without an explicit one.
    pub thumb_media_id: Option<String>,
    pub api_base: String,
    pub show_cover_pic: u8,
    pub need_open_comment: u8,
    pub only_fans_can_comment: u8,
}

impl Default for WechatConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            app_secret: String::new(),
            thumb_media_id: None,
            api_base: "https://api.weixin.qq.com".to_string(),
            show_cover_pic: 1,
            need_open_comment: 0,
            only_fans_can_comment: 0,
        }
    }
}

impl WechatConfig {
    pub fn is_configured(&self) -> bool {
        !self.app_id.is_empty() && !self.app_secret.is_empty()
    }
}

/// Group-chat robot webhooks.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WxworkConfig {
    pub robot_keys: Vec<String>,
    pub webhook_url: String,
}

impl Default for WxworkConfig {
    fn default() -> Self {
        Self {
            robot_keys: Vec::new(),
            webhook_url: "https://qyapi.weixin.qq.com/cgi-bin/webhook/send".to_string(),
        }
    }
}

/// How a digest is assembled and rendered.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DigestSettings {
    pub title: String,
    pub top_n: usize,
    pub message_budget_bytes: usize,
    pub fallback_phrase: String,
    /// Hosts whose links render without a raw-URL line.
    pub first_party_domains: Vec<String>,
    /// Promotional section title; only used when `promo` is set.
    pub promo_title: String,
    pub promo: Option<Item>,
}

impl Default for DigestSettings {
    fn default() -> Self {
        let promo_text = "ph8 large-model API: every major model at 30% of the official price, with extra discounts on top-ups (ph8.co)";
        Self {
            title: "Daily AI Digest".to_string(),
            top_n: 5,
            message_budget_bytes: DEFAULT_BUDGET_BYTES,
            fallback_phrase:
                "Live in the moment and cherish what is in front of you. --Lin Qingxuan"
                    .to_string(),
            first_party_domains: vec!["ph8.co".to_string()],
            promo_title: "Large-Model API".to_string(),
            promo: Some(Item::titled(promo_text, "https://ph8.co")),
        }
    }
}

/// Shared HTTP client settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("daily_ai_digest/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 30,
        }
    }
}

/// Values supplied on the command line or through the environment.
///
/// `None` leaves the file (or default) value untouched.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub openai_model: Option<String>,
    pub serpapi_key: Option<String>,
    pub robot_keys: Option<String>,
    pub wechat_app_id: Option<String>,
    pub wechat_app_secret: Option<String>,
    pub wechat_media_id: Option<String>,
}

impl Config {
    /// Load configuration from an optional YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            debug!("No config file given; using defaults");
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let config = Self::from_yaml(&raw).map_err(|source| ConfigError::Yaml {
            path: path.to_string(),
            source,
        })?;
        info!(path, "Loaded configuration");
        Ok(config)
    }

    /// Parse configuration from YAML text. Empty text yields the defaults.
    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Apply command-line/environment values on top of the loaded file.
    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(v) = overrides.openai_api_key {
            self.llm.api_key = v;
        }
        if let Some(v) = overrides.openai_base_url {
            self.llm.base_url = v;
        }
        if let Some(v) = overrides.openai_model {
            self.llm.model = v;
        }
        if let Some(v) = overrides.serpapi_key {
            self.search.serpapi_key = Some(v);
        }
        if let Some(v) = overrides.robot_keys {
            self.wxwork.robot_keys = v
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = overrides.wechat_app_id {
            self.wechat.app_id = v;
        }
        if let Some(v) = overrides.wechat_app_secret {
            self.wechat.app_secret = v;
        }
        if let Some(v) = overrides.wechat_media_id {
            self.wechat.thumb_media_id = Some(v);
        }
        self
    }

    /// Reject values the pipeline cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero message budget or an
    /// empty digest title.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.digest.message_budget_bytes == 0 {
            return Err(ConfigError::Invalid(
                "digest.message_budget_bytes must be positive".to_string(),
            ));
        }
        if self.digest.title.trim().is_empty() {
            return Err(ConfigError::Invalid("digest.title must not be empty".to_string()));
        }
        Ok(())
    }

    /// Build the HTTP client shared by scrapers and publishers.
    pub fn http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .user_agent(&self.http.user_agent)
            .timeout(Duration::from_secs(self.http.timeout_secs))
            .build()
    }
}

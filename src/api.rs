//! Chat-completion API interaction with exponential backoff retry logic.
//!
//! This module provides the language-model collaborator used for two small
//! jobs: writing the digest's closing phrase and translating paper titles.
//!
//! # Architecture
//!
//! - [`ChatCompletion`]: Core trait defining async chat completion
//! - [`OpenAiChat`]: Talks to any OpenAI-compatible `/chat/completions` endpoint
//! - [`RetryAsk`]: Decorator that adds retry logic to any `ChatCompletion`
//! - [`WarmPhraseGenerator`] / [`LlmWarmPhrase`]: The closing-phrase capability
//! - [`Translator`] / [`LlmTranslator`]: One-sentence translation for paper titles
//!
//! # Retry Strategy
//!
//! Retries live inside this collaborator only; scrapers and publishers never
//! retry.
//!
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use crate::config::LlmConfig;
use crate::error::{GenerationError, LlmError};
use crate::utils::{collapse_whitespace, truncate_for_log};
use async_trait::async_trait;
use rand::{rng, Rng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// One message in a chat-completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Trait for async chat completion.
///
/// Implementors send a conversation to a language model and return the
/// assistant's reply. `temperature` overrides the configured default when set.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: Option<f32>,
    ) -> Result<String, LlmError>;
}

#[async_trait]
impl<T: ChatCompletion + ?Sized> ChatCompletion for std::sync::Arc<T> {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: Option<f32>,
    ) -> Result<String, LlmError> {
        (**self).complete(messages, temperature).await
    }
}

/// Client for an OpenAI-compatible chat-completion endpoint.
pub struct OpenAiChat {
    client: reqwest::Client,
    config: LlmConfig,
}

impl OpenAiChat {
    pub fn new(client: reqwest::Client, config: LlmConfig) -> Self {
        Self { client, config }
    }
}

impl fmt::Debug for OpenAiChat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiChat")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .finish()
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl ChatCompletion for OpenAiChat {
    #[instrument(level = "info", skip_all, fields(model = %self.config.model))]
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: Option<f32>,
    ) -> Result<String, LlmError> {
        let t0 = Instant::now();
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let request = CompletionRequest {
            model: &self.config.model,
            messages,
            max_tokens: self.config.max_tokens,
            temperature: temperature.unwrap_or(self.config.temperature),
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                elapsed_ms = t0.elapsed().as_millis(),
                %status,
                body = %truncate_for_log(&body, 300),
                "API call failed"
            );
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyCompletion)
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`ChatCompletion`].
///
/// # Backoff Strategy
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryAsk<T> {
    /// The underlying client to wrap.
    inner: T,
    /// Maximum number of retry attempts before giving up.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: ChatCompletion,
{
    /// Create a new retry wrapper around an existing [`ChatCompletion`] implementation.
    ///
    /// ```ignore
    /// let api = RetryAsk::new(OpenAiChat::new(client, config.llm.clone()), 3, Duration::from_secs(1));
    /// ```
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

#[async_trait]
impl<T> ChatCompletion for RetryAsk<T>
where
    T: ChatCompletion,
{
    #[instrument(level = "info", skip_all)]
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: Option<f32>,
    ) -> Result<String, LlmError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            let err = match self.inner.complete(messages, temperature).await {
                Ok(resp) => return Ok(resp),
                Err(e) => e,
            };

            attempt += 1;
            let attempt_dt = attempt_t0.elapsed();
            let total_dt = total_t0.elapsed();

            if attempt > self.max_retries {
                error!(
                    attempt,
                    max = self.max_retries,
                    elapsed_ms_attempt = attempt_dt.as_millis(),
                    elapsed_ms_total = total_dt.as_millis(),
                    error = %err,
                    "complete() exhausted retries"
                );
                return Err(err);
            }

            // backoff calc
            let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1).min(16));
            if delay > self.max_delay {
                delay = self.max_delay;
            }
            let jitter_ms: u64 = rng().random_range(0..=250);
            let delay = delay + StdDuration::from_millis(jitter_ms);

            warn!(
                attempt,
                max = self.max_retries,
                elapsed_ms_attempt = attempt_dt.as_millis(),
                elapsed_ms_total = total_dt.as_millis(),
                ?delay,
                error = %err,
                "complete() attempt failed; backing off"
            );
            sleep(delay).await;
        }
    }
}

/// Produces the one-line closing phrase of a digest.
#[async_trait]
pub trait WarmPhraseGenerator: Send + Sync {
    async fn generate(&self) -> Result<String, GenerationError>;
}

const WARM_PHRASE_PROMPT: &str = "给我写一个每日寄语，要求简短，但是要温暖人心，或者俏皮，引用名人名言， 这个寄语要非常简单,仅一句话表达即可，不要换行, 格式要求:   xxxx--名人";

/// Closing phrase written by a language model.
pub struct LlmWarmPhrase<C> {
    chat: C,
}

impl<C: ChatCompletion> LlmWarmPhrase<C> {
    pub fn new(chat: C) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl<C: ChatCompletion> WarmPhraseGenerator for LlmWarmPhrase<C> {
    #[instrument(level = "info", skip_all)]
    async fn generate(&self) -> Result<String, GenerationError> {
        let messages = [
            ChatMessage::system("你是一个有用的助手"),
            ChatMessage::user(WARM_PHRASE_PROMPT),
        ];
        let reply = self.chat.complete(&messages, Some(1.4)).await?;
        let phrase = collapse_whitespace(&reply);
        if phrase.is_empty() {
            return Err(GenerationError::Empty);
        }
        info!(phrase = %phrase, "Generated closing phrase");
        Ok(phrase)
    }
}

/// Translates short text into a one-sentence blurb.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String, LlmError>;
}

/// One-sentence Chinese translation written by a language model.
pub struct LlmTranslator<C> {
    chat: C,
}

impl<C: ChatCompletion> LlmTranslator<C> {
    pub fn new(chat: C) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl<C: ChatCompletion> Translator for LlmTranslator<C> {
    async fn translate(&self, text: &str) -> Result<String, LlmError> {
        let prompt = format!("{text} \n 请你将上诉文本简要翻译成中文，仅一句话");
        let reply = self.chat.complete(&[ChatMessage::user(prompt)], None).await?;
        Ok(collapse_whitespace(&reply))
    }
}

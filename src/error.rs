//! Error types for collection, generation, rendering and publishing.
//!
//! Only [`DigestError`], [`ConfigError`] and [`WorkflowError`] are allowed
//! to stop a run. The others are caught at the pipeline boundary, logged, and turned into an
//! omitted section, a fallback phrase, or a failed destination.

use thiserror::Error;

/// A scraper could not produce items.
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response did not have the expected shape
    #[error("Unexpected response: {0}")]
    Parse(String),

    /// A required key or endpoint is missing
    #[error("Source not configured: {0}")]
    NotConfigured(String),

    /// The scraper task panicked or was cancelled
    #[error("Source task aborted: {0}")]
    Aborted(String),
}

/// A call to the chat-completion API failed.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Completion had no content")]
    EmptyCompletion,
}

/// The closing phrase could not be generated.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Language model call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Language model returned an empty phrase")]
    Empty,
}

/// Publishing to a destination failed.
#[derive(Debug, Error)]
pub enum PublishError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Publisher is not configured
    #[error("Publisher not configured: {0}")]
    NotConfigured(String),

    /// The platform answered with a non-zero error code
    #[error("Platform error {errcode}: {errmsg}")]
    Api { errcode: i64, errmsg: String },

    /// Every destination failed
    #[error("All {attempted} destinations failed")]
    AllFailed { attempted: usize },

    /// A local image could not be read for upload
    #[error("Failed to read image {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The article body could not be generated
    #[error("Article generation failed: {0}")]
    Llm(#[from] LlmError),

    /// The generated reply had no fenced html block
    #[error("Generated article has no html block")]
    MissingHtml,
}

/// A digest broke an invariant the renderers rely on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DigestError {
    #[error("Section `{title}` has no items")]
    EmptySection { title: String },
}

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML in {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// The daily run could not start or complete.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Neither publishing destination was enabled
    #[error("No publisher enabled; pass --publish-wechat and/or --publish-wxwork")]
    NoPublisher,

    #[error(transparent)]
    Digest(#[from] DigestError),
}

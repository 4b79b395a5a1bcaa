//! Configuration for resume matching.
//!
//! Every knob lives in [`MatchConfig`], built via [`MatchConfigBuilder`]. The
//! config is constructed once by the caller and passed by reference into
//! each pipeline component; nothing reads thresholds from global state.

use crate::error::MatchError;
use crate::pipeline::agent::AgentStage;
use crate::pipeline::extract::TextExtractor;
use crate::pipeline::keywords::DEFAULT_KEYWORD_LIMIT;
use crate::pipeline::normalize::DEFAULT_CHUNK_SIZE;
use crate::pipeline::retry::RetryPolicy;
use crate::progress::ProgressCallback;
use crate::source::OpportunitySource;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Model used when neither the caller nor the environment names one.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// How the agent stages are invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineMode {
    /// One retried call per stage; each stage's output feeds the next. (default)
    #[default]
    Staged,
    /// A single retried call whose prompt covers every stage.
    Combined,
}

/// Configuration for matching one resume.
///
/// Built via [`MatchConfig::builder()`] or using [`MatchConfig::default()`].
///
/// # Example
/// ```rust
/// use resume2intern::MatchConfig;
///
/// let config = MatchConfig::builder()
///     .max_pages(10)
///     .max_attempts(5)
///     .model("gemini-2.5-flash")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct MatchConfig {
    /// Largest accepted document, in bytes. Default: 5 MiB.
    pub max_document_bytes: u64,

    /// Most pages accepted in a PDF. Default: 20.
    pub max_pages: usize,

    /// Normaliser chunk size in characters. Default: 1000.
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks. Default: 0.
    pub chunk_overlap: usize,

    /// Attempts per agent call, first try included. Default: 3.
    pub max_attempts: u32,

    /// Linear backoff unit: attempt `n` sleeps `n × retry_base_delay`. Default: 3 s.
    pub retry_base_delay: Duration,

    /// Keywords fed to the fallback recommender. Default: 5.
    pub keyword_limit: usize,

    /// Staged or combined agent invocation. Default: [`PipelineMode::Staged`].
    pub mode: PipelineMode,

    /// Run the web-scrape stage after matching (staged mode only). Default: false.
    pub web_scrape: bool,

    /// Skip the agent entirely and serve the local recommender. Default: false.
    pub local_only: bool,

    /// LLM model identifier. If None, [`DEFAULT_MODEL`]. Set this when naming a
    /// provider other than Gemini.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed agent. Takes precedence over every provider setting.
    pub agent: Option<Arc<dyn AgentStage>>,

    /// Text extractor override. If None, chosen by file extension.
    pub extractor: Option<Arc<dyn TextExtractor>>,

    /// Opportunity source for the web-scrape stage and the fallback.
    /// If None, the builtin catalog.
    pub opportunity_source: Option<Arc<dyn OpportunitySource>>,

    /// Sampling temperature. Default: 0.5.
    pub temperature: f32,

    /// Maximum tokens generated per stage. Default: 4096.
    pub max_tokens: usize,

    /// Per-agent-call timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Optional stage progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_document_bytes: 5 * 1024 * 1024,
            max_pages: 20,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: 0,
            max_attempts: 3,
            retry_base_delay: Duration::from_secs(3),
            keyword_limit: DEFAULT_KEYWORD_LIMIT,
            mode: PipelineMode::default(),
            web_scrape: false,
            local_only: false,
            model: None,
            provider_name: None,
            provider: None,
            agent: None,
            extractor: None,
            opportunity_source: None,
            temperature: 0.5,
            max_tokens: 4096,
            api_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for MatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchConfig")
            .field("max_document_bytes", &self.max_document_bytes)
            .field("max_pages", &self.max_pages)
            .field("chunk_size", &self.chunk_size)
            .field("chunk_overlap", &self.chunk_overlap)
            .field("max_attempts", &self.max_attempts)
            .field("retry_base_delay", &self.retry_base_delay)
            .field("keyword_limit", &self.keyword_limit)
            .field("mode", &self.mode)
            .field("web_scrape", &self.web_scrape)
            .field("local_only", &self.local_only)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("agent", &self.agent.as_ref().map(|_| "<dyn AgentStage>"))
            .field("extractor", &self.extractor.as_ref().map(|_| "<dyn TextExtractor>"))
            .field(
                "opportunity_source",
                &self.opportunity_source.as_ref().map(|s| s.name().to_string()),
            )
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .finish()
    }
}

impl MatchConfig {
    /// Create a new builder for `MatchConfig`.
    pub fn builder() -> MatchConfigBuilder {
        MatchConfigBuilder {
            config: Self::default(),
        }
    }

    /// The retry policy every agent call runs under.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: self.retry_base_delay,
        }
    }
}

/// Builder for [`MatchConfig`].
#[derive(Debug)]
pub struct MatchConfigBuilder {
    config: MatchConfig,
}

impl MatchConfigBuilder {
    pub fn max_document_bytes(mut self, bytes: u64) -> Self {
        self.config.max_document_bytes = bytes;
        self
    }

    pub fn max_pages(mut self, pages: usize) -> Self {
        self.config.max_pages = pages;
        self
    }

    pub fn chunk_size(mut self, chars: usize) -> Self {
        self.config.chunk_size = chars;
        self
    }

    pub fn chunk_overlap(mut self, chars: usize) -> Self {
        self.config.chunk_overlap = chars;
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.max_attempts = n;
        self
    }

    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.config.retry_base_delay = delay;
        self
    }

    pub fn keyword_limit(mut self, n: usize) -> Self {
        self.config.keyword_limit = n;
        self
    }

    pub fn mode(mut self, mode: PipelineMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn web_scrape(mut self, v: bool) -> Self {
        self.config.web_scrape = v;
        self
    }

    pub fn local_only(mut self, v: bool) -> Self {
        self.config.local_only = v;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn agent(mut self, agent: Arc<dyn AgentStage>) -> Self {
        self.config.agent = Some(agent);
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.config.extractor = Some(extractor);
        self
    }

    pub fn opportunity_source(mut self, source: Arc<dyn OpportunitySource>) -> Self {
        self.config.opportunity_source = Some(source);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.config.progress_callback = Some(callback);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<MatchConfig, MatchError> {
        let c = &self.config;
        if c.max_document_bytes == 0 {
            return Err(MatchError::InvalidConfig(
                "max_document_bytes must be ≥ 1".into(),
            ));
        }
        if c.max_pages == 0 {
            return Err(MatchError::InvalidConfig("max_pages must be ≥ 1".into()));
        }
        if c.chunk_size == 0 {
            return Err(MatchError::InvalidConfig("chunk_size must be ≥ 1".into()));
        }
        if c.chunk_overlap >= c.chunk_size {
            return Err(MatchError::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                c.chunk_overlap, c.chunk_size
            )));
        }
        if c.max_attempts == 0 {
            return Err(MatchError::InvalidConfig("max_attempts must be ≥ 1".into()));
        }
        if c.keyword_limit == 0 {
            return Err(MatchError::InvalidConfig("keyword_limit must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

//! LLM agent stages: the only part of the pipeline with network I/O.
//!
//! [`AgentStage`] is the seam between the orchestrator and whatever answers
//! the prompts. The production implementation, [`LlmAgent`], wraps an
//! `edgequake_llm` provider; tests substitute scripted agents. The module is
//! intentionally thin: prompts live in [`crate::prompts`] and retry policy in
//! [`crate::pipeline::retry`].

use crate::config::MatchConfig;
use crate::error::StageError;
use crate::prompts::system_prompt_for;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// One discrete phase of the agent pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Extract the candidate profile from the normalised resume.
    DocumentAnalysis,
    /// Condense the profile into a matching brief.
    Summary,
    /// Pick the top internships for the brief.
    Matching,
    /// Check the picks against live listings (optional).
    WebScrape,
    /// All of the above in a single invocation.
    Combined,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::DocumentAnalysis => "document_analysis",
            Stage::Summary => "summary",
            Stage::Matching => "matching",
            Stage::WebScrape => "web_scrape",
            Stage::Combined => "combined",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that can answer a stage prompt.
///
/// Failures are reported as [`StageError`]; their message is what the retry
/// classifier inspects, so implementations should keep upstream wording.
#[async_trait]
pub trait AgentStage: Send + Sync {
    async fn invoke(&self, stage: Stage, input: &str) -> Result<String, StageError>;
}

/// [`AgentStage`] backed by an `edgequake_llm` chat provider.
///
/// ## Message Layout
///
/// 1. **System message** — the stage prompt from [`crate::prompts`]
/// 2. **User message** — the stage input (normalised resume or the previous
///    stage's output)
pub struct LlmAgent {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
    timeout: Duration,
}

impl LlmAgent {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &MatchConfig) -> Self {
        Self {
            provider,
            options: build_options(config),
            timeout: Duration::from_secs(config.api_timeout_secs),
        }
    }
}

#[async_trait]
impl AgentStage for LlmAgent {
    async fn invoke(&self, stage: Stage, input: &str) -> Result<String, StageError> {
        let start = Instant::now();
        let messages = vec![
            ChatMessage::system(system_prompt_for(stage)),
            ChatMessage::user(input),
        ];

        let call = self.provider.chat(&messages, Some(&self.options));
        let response = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(StageError::new(e.to_string())),
            Err(_) => {
                return Err(StageError::new(format!(
                    "{stage}: deadline exceeded after {}s",
                    self.timeout.as_secs()
                )))
            }
        };

        debug!(
            "{}: {} input tokens, {} output tokens, {:?}",
            stage,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        Ok(response.content)
    }
}

/// Build `CompletionOptions` from the match config.
fn build_options(config: &MatchConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults() {
        let config = MatchConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.5));
        assert_eq!(opts.max_tokens, Some(4096));
    }

    #[test]
    fn stage_names_are_snake_case() {
        assert_eq!(Stage::DocumentAnalysis.to_string(), "document_analysis");
        assert_eq!(Stage::WebScrape.as_str(), "web_scrape");
        assert_eq!(
            serde_json::to_string(&Stage::Combined).unwrap(),
            "\"combined\""
        );
    }
}

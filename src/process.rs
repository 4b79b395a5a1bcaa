//! Pipeline orchestration entry points.
//!
//! ```text
//!  source ─► gate ─► normalise ─► agent stages (retried) ─► parse ─► Success
//!              │                        │                     │
//!              ▼                        ▼ transient           ▼ empty
//!           Rejected               keywords ─► recommend ─► format ─► Fallback
//! ```
//!
//! Non-transient stage failures are returned as `Err` and never masked by the
//! fallback recommender.

use crate::config::{MatchConfig, PipelineMode, DEFAULT_MODEL};
use crate::error::MatchError;
use crate::output::{PipelineOutcome, MAX_RECOMMENDATIONS};
use crate::pipeline::agent::{AgentStage, LlmAgent, Stage};
use crate::pipeline::gate::{self, DocumentSource};
use crate::pipeline::keywords::extract_keywords;
use crate::pipeline::normalize::normalize_content;
use crate::pipeline::parse::{format_internships, parse_internships};
use crate::pipeline::recommend::recommend;
use crate::pipeline::retry::RetryExhausted;
use crate::prompts::web_scrape_input;
use crate::source::{render_listing, Opportunity, BUILTIN_CATALOG};
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Fallback reason when `local_only` is set.
pub const LOCAL_ONLY_REASON: &str = "LLM pipeline disabled";

/// Fallback reason when the agent answered but nothing parsed.
pub const EMPTY_RESULT_REASON: &str = "Agent pipeline returned no parseable internships";

/// Match a resume given as a file path or as raw text.
///
/// This is the primary entry point for the library. `input` is classified by
/// [`DocumentSource::detect`].
///
/// # Returns
/// `Ok(PipelineOutcome)` for every document the pipeline could reason about,
/// including rejected ones.
///
/// # Errors
/// Returns `Err(MatchError)` only for fatal errors:
/// - No LLM provider could be configured
/// - A stage failed with a non-transient error
pub async fn process(
    input: impl AsRef<str>,
    config: &MatchConfig,
) -> Result<PipelineOutcome, MatchError> {
    process_document(&DocumentSource::detect(input.as_ref()), config).await
}

/// Match an already classified document.
pub async fn process_document(
    source: &DocumentSource,
    config: &MatchConfig,
) -> Result<PipelineOutcome, MatchError> {
    let start = Instant::now();

    // ── Step 1: Gate ─────────────────────────────────────────────────────
    let raw = match gate::admit(source, config).await {
        Ok(raw) => raw,
        Err(rejection) => {
            info!("Document rejected: {} ({})", rejection.code, rejection.message);
            return Ok(rejection.into());
        }
    };

    // ── Step 2: Normalise ────────────────────────────────────────────────
    let content = normalize_content(&raw, config.chunk_size, config.chunk_overlap);
    debug!(
        "Normalised {} raw characters into {} characters",
        raw.chars().count(),
        content.chars().count()
    );

    if config.local_only {
        return Ok(serve_fallback(&content, LOCAL_ONLY_REASON.to_string(), config).await);
    }

    // ── Step 3: Resolve agent ────────────────────────────────────────────
    let agent = resolve_agent(config)?;

    // ── Step 4: Run stages ───────────────────────────────────────────────
    let raw_output = match run_stages(agent.as_ref(), &content, config).await {
        Ok(output) => output,
        Err((stage, RetryExhausted { attempts, error })) => {
            if error.is_transient() {
                return Ok(serve_fallback(&content, error.message, config).await);
            }
            return Err(MatchError::StageFailed {
                stage,
                attempts,
                message: error.message,
            });
        }
    };

    // ── Step 5: Parse ────────────────────────────────────────────────────
    let mut internships = parse_internships(&raw_output);
    if internships.is_empty() {
        debug!("Unparseable agent output: {:?}", raw_output);
        return Ok(serve_fallback(&content, EMPTY_RESULT_REASON.to_string(), config).await);
    }
    if internships.len() > MAX_RECOMMENDATIONS {
        debug!(
            "Agent returned {} internships, keeping {}",
            internships.len(),
            MAX_RECOMMENDATIONS
        );
        internships.truncate(MAX_RECOMMENDATIONS);
    }

    let mut seen = BTreeSet::new();
    let duplicates: Vec<u32> = internships
        .iter()
        .filter(|r| !seen.insert(r.id))
        .map(|r| r.id)
        .collect();
    if !duplicates.is_empty() {
        warn!("Agent output repeats internship ids {:?}; passing them through", duplicates);
    }

    info!(
        "Matched {} internships in {}ms",
        internships.len(),
        start.elapsed().as_millis()
    );

    Ok(PipelineOutcome::Success {
        internships,
        raw_output,
    })
}

/// Match a resume held in memory as PDF bytes.
///
/// The bytes are spooled to a managed [`tempfile`] which is removed on return.
pub async fn process_bytes(
    bytes: &[u8],
    config: &MatchConfig,
) -> Result<PipelineOutcome, MatchError> {
    let mut tmp = tempfile::Builder::new()
        .prefix("resume-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| MatchError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| MatchError::Internal(format!("tempfile write: {e}")))?;
    tmp.flush()
        .map_err(|e| MatchError::Internal(format!("tempfile flush: {e}")))?;

    let source = DocumentSource::Path(tmp.path().to_path_buf());
    // `tmp` is dropped (and the file deleted) when this returns
    process_document(&source, config).await
}

/// Synchronous wrapper around [`process`].
///
/// Creates a temporary tokio runtime internally.
pub fn process_sync(
    input: impl AsRef<str>,
    config: &MatchConfig,
) -> Result<PipelineOutcome, MatchError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| MatchError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(process(input, config))
}

/// Match a resume and write the outcome JSON to `output_path`.
pub async fn process_to_file(
    input: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &MatchConfig,
) -> Result<PipelineOutcome, MatchError> {
    let outcome = process(input, config).await?;
    write_outcome(&outcome, output_path.as_ref()).await?;
    Ok(outcome)
}

/// Write `outcome` as pretty JSON to `path`, creating parent directories.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn write_outcome(outcome: &PipelineOutcome, path: &Path) -> Result<(), MatchError> {
    let json = serde_json::to_string_pretty(outcome)
        .map_err(|e| MatchError::Internal(format!("outcome serialisation: {e}")))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| MatchError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json)
        .await
        .map_err(|e| MatchError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| MatchError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Stages for the configured mode, in execution order.
fn planned_stages(config: &MatchConfig) -> Vec<Stage> {
    match config.mode {
        PipelineMode::Combined => vec![Stage::Combined],
        PipelineMode::Staged => {
            let mut stages = vec![Stage::DocumentAnalysis, Stage::Summary, Stage::Matching];
            if config.web_scrape {
                stages.push(Stage::WebScrape);
            }
            stages
        }
    }
}

/// Run every planned stage, feeding each output into the next stage.
///
/// On failure returns the failing stage with its final error.
async fn run_stages(
    agent: &dyn AgentStage,
    content: &str,
    config: &MatchConfig,
) -> Result<String, (Stage, RetryExhausted)> {
    let stages = planned_stages(config);
    let total = stages.len();
    let policy = config.retry_policy();
    let progress = config.progress_callback.as_ref();

    if let Some(cb) = progress {
        cb.on_pipeline_start(total);
    }

    let mut carry = content.to_string();
    for (idx, stage) in stages.into_iter().enumerate() {
        if let Some(cb) = progress {
            cb.on_stage_start(stage, idx + 1, total);
        }

        let input = match stage {
            Stage::WebScrape => {
                let listing = render_listing(&load_opportunities(config).await);
                web_scrape_input(&carry, &listing)
            }
            _ => carry,
        };
        info!("Running {} stage ({}/{})", stage, idx + 1, total);

        let input: &str = &input;
        let output = policy
            .run(stage, progress, move |attempt| async move {
                debug!("{} attempt {}: {} input characters", stage, attempt, input.len());
                agent.invoke(stage, input).await
            })
            .await
            .map_err(|exhausted| (stage, exhausted))?;

        if let Some(cb) = progress {
            cb.on_stage_complete(stage, output.len());
        }
        carry = output;
    }

    Ok(carry)
}

/// Keyword-rank the opportunity catalog against the normalised resume.
async fn serve_fallback(content: &str, reason: String, config: &MatchConfig) -> PipelineOutcome {
    warn!("Serving local fallback recommendations: {}", reason);
    if let Some(ref cb) = config.progress_callback {
        cb.on_fallback(&reason);
    }

    let keywords = extract_keywords(content, config.keyword_limit);
    let catalog = load_opportunities(config).await;
    let internships = recommend(&keywords, &catalog);
    debug!("Fallback keywords: {:?}", keywords);

    PipelineOutcome::Fallback {
        raw_output: format_internships(&internships),
        internships,
        reason,
        keywords,
    }
}

/// Opportunities from the configured source, or the builtin catalog.
///
/// Never fails: a broken or empty source degrades to the builtin catalog.
async fn load_opportunities(config: &MatchConfig) -> Vec<Opportunity> {
    let Some(ref source) = config.opportunity_source else {
        return BUILTIN_CATALOG.clone();
    };

    match source.opportunities().await {
        Ok(entries) if !entries.is_empty() => {
            debug!("{} opportunities from {}", entries.len(), source.name());
            entries
        }
        Ok(_) => {
            warn!("Opportunity source {} is empty; using builtin catalog", source.name());
            BUILTIN_CATALOG.clone()
        }
        Err(e) => {
            warn!("{}; using builtin catalog", e);
            BUILTIN_CATALOG.clone()
        }
    }
}

/// The agent every stage is sent to.
fn resolve_agent(config: &MatchConfig) -> Result<Arc<dyn AgentStage>, MatchError> {
    if let Some(ref agent) = config.agent {
        return Ok(Arc::clone(agent));
    }
    let provider = resolve_provider(config)?;
    Ok(Arc::new(LlmAgent::new(provider, config)))
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, MatchError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        MatchError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`).
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`),
///    honoured even when several API keys are present.
/// 4. **Gemini** when `GEMINI_API_KEY` or `GOOGLE_API_KEY` is set.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
fn resolve_provider(config: &MatchConfig) -> Result<Arc<dyn LLMProvider>, MatchError> {
    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_provider(name, model);
    }

    if let (Some(prov), Some(env_model)) = (
        non_empty_env("EDGEQUAKE_LLM_PROVIDER"),
        non_empty_env("EDGEQUAKE_MODEL"),
    ) {
        return create_provider(&prov, &env_model);
    }

    if non_empty_env("GEMINI_API_KEY").is_some() || non_empty_env("GOOGLE_API_KEY").is_some() {
        return create_provider("gemini", model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| MatchError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY, or configure a provider.\n\
                Use --local-only to skip the LLM pipeline.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

//! # resume2intern
//!
//! Match a resume (PDF or text) to internships with a staged LLM pipeline,
//! falling back to a deterministic keyword recommender when the LLM is
//! unavailable.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Resume
//!  │
//!  ├─ 1. Gate       size / page-count / empty-text checks → Rejected
//!  ├─ 2. Normalise  1000-char chunks, cleaned and re-joined
//!  ├─ 3. Agent      analysis → summary → matching (→ web scrape), retried
//!  ├─ 4. Parse      "N- Company\nPosition\nlink: url" blocks → records
//!  └─ 5. Fallback   keywords × catalog tags → top 3 (on transient failure
//!                   or empty parse)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resume2intern::{process, MatchConfig, PipelineOutcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / …
//!     let config = MatchConfig::default();
//!     let outcome = process("resume.pdf", &config).await?;
//!     for internship in outcome.internships() {
//!         println!("{}. {} — {}", internship.id, internship.company, internship.url);
//!     }
//!     if let PipelineOutcome::Fallback { reason, .. } = &outcome {
//!         eprintln!("served by local fallback: {reason}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `resume2intern` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! resume2intern = { version = "0.2", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod progress;
pub mod prompts;
pub mod source;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{MatchConfig, MatchConfigBuilder, PipelineMode, DEFAULT_MODEL};
pub use error::{MatchError, StageError};
pub use output::{InternshipRecord, PipelineOutcome, RejectionCode, ResultSource};
pub use pipeline::agent::{AgentStage, LlmAgent, Stage};
pub use pipeline::extract::{PdfiumExtractor, PlainTextExtractor, TextExtractor};
pub use pipeline::gate::DocumentSource;
pub use process::{
    process, process_bytes, process_document, process_sync, process_to_file, write_outcome,
};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback};
pub use source::{Opportunity, OpportunitySource, RemoteCatalog, StaticCatalog};

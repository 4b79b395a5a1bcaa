//! Error types for the resume2intern library.
//!
//! Three distinct failure modes exist, and only one of them is a Rust error:
//!
//! * [`MatchError`] — **Fatal**: processing cannot produce an outcome at all
//!   (provider not configured, a stage failed with a non-transient error,
//!   invalid configuration). Returned as `Err(MatchError)` from the
//!   top-level `process*` functions.
//!
//! * [`StageError`] — **Per call**: one collaborator invocation failed. The
//!   retry loop inspects it, and the orchestrator either retries, downgrades
//!   to the local fallback, or promotes it to [`MatchError::StageFailed`].
//!
//! * Input-validation problems (oversized file, too many pages, no text) are
//!   not errors at all. They are reported as
//!   [`crate::output::PipelineOutcome::Rejected`] so the boundary layer can
//!   serialise them like any other outcome.

use crate::pipeline::agent::Stage;
use crate::pipeline::retry::{classify_failure, FailureClass};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the resume2intern library.
#[derive(Debug, Error)]
pub enum MatchError {
    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// A stage failed with an error that retrying cannot fix.
    ///
    /// These are never masked by the fallback recommender: a bad request or
    /// a broken prompt must surface to the caller.
    #[error("{stage} stage failed after {attempts} attempt(s): {message}")]
    StageFailed {
        stage: Stage,
        attempts: u32,
        message: String,
    },

    // ── Catalog errors ────────────────────────────────────────────────────
    /// HTTP URL was syntactically valid but the catalog download failed.
    #[error("Failed to fetch opportunity catalog '{url}': {reason}")]
    CatalogFetchFailed { url: String, reason: String },

    /// Catalog download exceeded the configured timeout.
    #[error("Opportunity catalog download timed out after {secs}s for '{url}'")]
    CatalogTimeout { url: String, secs: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output JSON file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure of a single collaborator call.
///
/// Only the message matters: upstream providers expose wildly different error
/// types, and the transient/fatal decision is made from the text alone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StageError {
    pub message: String,
}

impl StageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Classify this failure with the fixed hint table.
    pub fn class(&self) -> FailureClass {
        classify_failure(&self.message)
    }

    pub fn is_transient(&self) -> bool {
        self.class() == FailureClass::Transient
    }
}

impl From<String> for StageError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for StageError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_failed_display() {
        let e = MatchError::StageFailed {
            stage: Stage::Matching,
            attempts: 1,
            message: "invalid request: bad prompt".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("matching"), "got: {msg}");
        assert!(msg.contains("invalid request"), "got: {msg}");
    }

    #[test]
    fn catalog_timeout_display() {
        let e = MatchError::CatalogTimeout {
            url: "https://jobs.example.org/catalog.json".into(),
            secs: 15,
        };
        assert!(e.to_string().contains("15s"));
    }

    #[test]
    fn stage_error_classification() {
        assert!(StageError::new("429 Too Many Requests").is_transient());
        assert!(StageError::from("Quota exceeded for model").is_transient());
        assert!(!StageError::from("invalid request").is_transient());
    }

    #[test]
    fn stage_error_displays_message_verbatim() {
        let e = StageError::new("LLM Failed: upstream closed");
        assert_eq!(e.to_string(), "LLM Failed: upstream closed");
    }
}

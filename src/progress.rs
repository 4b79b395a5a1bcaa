//! Progress-callback trait for per-stage pipeline events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::MatchConfigBuilder::progress_callback`] to receive events
//! as the orchestrator walks through its stages.
//!
//! # Example
//!
//! ```rust
//! use resume2intern::{MatchConfig, PipelineProgressCallback, Stage};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl PipelineProgressCallback for CountingCallback {
//!     fn on_stage_complete(&self, stage: Stage, output_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{stage} done ({output_len} bytes)");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = MatchConfig::builder()
//!     .progress_callback(counter as Arc<dyn PipelineProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::pipeline::agent::Stage;
use std::sync::Arc;
use std::time::Duration;

/// Called by the orchestrator as it processes a document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called once the document passed the gate, before the first stage.
    fn on_pipeline_start(&self, total_stages: usize) {
        let _ = total_stages;
    }

    /// Called just before a stage's first attempt.
    ///
    /// `index` is 1-based.
    fn on_stage_start(&self, stage: Stage, index: usize, total_stages: usize) {
        let _ = (stage, index, total_stages);
    }

    /// Called when a stage returned text.
    fn on_stage_complete(&self, stage: Stage, output_len: usize) {
        let _ = (stage, output_len);
    }

    /// Called after a transient failure, before the backoff sleep.
    fn on_stage_retry(&self, stage: Stage, attempt: u32, max_attempts: u32, delay: Duration) {
        let _ = (stage, attempt, max_attempts, delay);
    }

    /// Called when the local recommender is about to serve the result.
    fn on_fallback(&self, reason: &str) {
        let _ = reason;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::MatchConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;

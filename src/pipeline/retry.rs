//! Transient-failure classification and bounded retry.
//!
//! ## Classification
//!
//! Upstream providers do not agree on error types, so the decision is made
//! from the failure message alone: a case-insensitive substring match against
//! [`TRANSIENT_HINTS`]. Anything else is fatal and is never retried.
//!
//! ## Retry Strategy
//!
//! Linear backoff (`base_delay * attempt`): with the default 3 s base and
//! 3 attempts the waits are 3 s → 6 s, i.e. at most 9 s of back-off per
//! stage. The final attempt's error is returned unchanged so the caller can
//! decide between the local fallback and propagation.

use crate::error::StageError;
use crate::pipeline::agent::Stage;
use crate::progress::ProgressCallback;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Lower-cased phrases that mark an upstream failure as worth retrying.
pub const TRANSIENT_HINTS: &[&str] = &[
    "llm failed",
    "quota",
    "rate limit",
    "429",
    "temporarily unavailable",
    "deadline exceeded",
    "unavailable",
    "exceeded",
];

/// Outcome of [`classify_failure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Likely to succeed on retry (rate limits, quota, timeouts).
    Transient,
    /// Retrying cannot help; propagate immediately.
    Fatal,
}

/// Classify an upstream failure message.
pub fn classify_failure(message: &str) -> FailureClass {
    let lowered = message.to_lowercase();
    if TRANSIENT_HINTS.iter().any(|hint| lowered.contains(hint)) {
        FailureClass::Transient
    } else {
        FailureClass::Fatal
    }
}

/// Attempt ceiling and backoff base for collaborator calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(3),
        }
    }
}

/// A failed call together with how many attempts were spent on it.
#[derive(Debug, Clone)]
pub struct RetryExhausted {
    pub attempts: u32,
    pub error: StageError,
}

impl RetryPolicy {
    /// Delay slept after failed attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Run `call` until it succeeds, fails fatally, or the ceiling is hit.
    ///
    /// `call` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(
        &self,
        stage: Stage,
        progress: Option<&ProgressCallback>,
        mut call: F,
    ) -> Result<T, RetryExhausted>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, StageError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match call(attempt).await {
                Ok(value) => {
                    debug!("{} stage succeeded on attempt {}", stage, attempt);
                    return Ok(value);
                }
                Err(error) => {
                    if !error.is_transient() || attempt >= max_attempts {
                        return Err(RetryExhausted { attempts: attempt, error });
                    }

                    let sleep_for = self.delay_for(attempt);
                    warn!(
                        "{} stage failed due to transient LLM issue ({}). Retrying in {:?} ({}/{})",
                        stage, error, sleep_for, attempt, max_attempts
                    );
                    if let Some(cb) = progress {
                        cb.on_stage_retry(stage, attempt, max_attempts, sleep_for);
                    }
                    if !sleep_for.is_zero() {
                        tokio::time::sleep(sleep_for).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}

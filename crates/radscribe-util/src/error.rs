//! Error taxonomy for the report pipeline.
//!
//! The taxonomy separates three failure classes that drive control flow:
//! transient provider failures (retried with backoff, then escalated to the
//! next candidate), parse failures (escalated immediately, never retried
//! against the same candidate), and chain exhaustion (every candidate for a
//! task failed, with every attempt's reason preserved).

use std::time::Duration;
use thiserror::Error;

use crate::types::TaskKind;

/// Errors surfaced by LLM provider backends
#[derive(Debug, Error)]
pub enum LlmError {
    /// Transport-level failure (connect error, broken body, missing content)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider authentication failure (401, 403, missing API key)
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Provider quota/rate limit exceeded (429)
    #[error("Provider quota exceeded: {0}")]
    ProviderQuota(String),

    /// Provider service outage (5xx)
    #[error("Provider outage: {0}")]
    ProviderOutage(String),

    /// Invocation timed out
    #[error("Timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// Configuration error (missing key, missing model, bad base URL)
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),

    /// Unknown provider or unsupported feature
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl LlmError {
    /// Whether retrying the same candidate can plausibly succeed.
    ///
    /// Only infrastructure-level failures qualify; auth and configuration
    /// errors fail identically on every attempt.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmError::Transport(_)
                | LlmError::ProviderQuota(_)
                | LlmError::ProviderOutage(_)
                | LlmError::Timeout { .. }
        )
    }
}

/// Model output that does not conform to the expected schema.
///
/// Never retried against the same candidate: a malformed-output failure
/// costs a full round-trip for no expected benefit, so the orchestrator
/// moves straight to the next candidate.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Payload is not valid JSON for the expected schema
    #[error("model output does not match expected schema: {detail} (got: {snippet:?})")]
    InvalidJson { detail: String, snippet: String },

    /// Payload parsed but a required element is unusable
    #[error("model output missing expected payload: {0}")]
    MissingPayload(String),
}

impl ParseError {
    /// Build an `InvalidJson` error from a serde failure, keeping a short
    /// prefix of the raw output for diagnostics.
    #[must_use]
    pub fn invalid_json(err: &serde_json::Error, raw: &str) -> Self {
        let snippet: String = raw.chars().take(120).collect();
        ParseError::InvalidJson {
            detail: err.to_string(),
            snippet,
        }
    }
}

/// One failed candidate attempt, recorded for diagnostics
#[derive(Debug, Clone)]
pub struct AttemptFailure {
    /// Provider key of the candidate
    pub provider: String,
    /// Model id of the candidate
    pub model: String,
    /// Why the candidate failed (transient escalation or parse failure)
    pub reason: String,
}

/// Every candidate in a task's chain failed.
///
/// Carries the failure reason from every attempted candidate, not just the
/// last one.
#[derive(Debug, Error)]
pub struct ChainExhausted {
    /// Task whose chain was exhausted
    pub task: TaskKind,
    /// All attempted candidates in chain order
    pub attempts: Vec<AttemptFailure>,
}

impl std::fmt::Display for ChainExhausted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "all {} candidate(s) for task '{}' failed",
            self.attempts.len(),
            self.task
        )?;
        for attempt in &self.attempts {
            write!(
                f,
                "; {}/{}: {}",
                attempt.provider, attempt.model, attempt.reason
            )?;
        }
        Ok(())
    }
}

/// Errors from the status and version stores
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record exists for the report id
    #[error("no record for report '{report_id}'")]
    NotFound { report_id: String },

    /// Attempted transition violates the pending -> terminal-once lifecycle
    #[error("invalid status transition for report '{report_id}': {from} -> {to}")]
    InvalidTransition {
        report_id: String,
        from: String,
        to: String,
    },

    /// Report id contains characters unsafe for persistence keys
    #[error("invalid report id '{0}': only alphanumerics, '.', '_', '-' are allowed")]
    InvalidReportId(String),

    /// Underlying filesystem failure
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted record could not be (de)serialized
    #[error("store serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Top-level pipeline error surface.
///
/// Generation failures are fatal for the whole operation; validation and fix
/// failures never reach the caller as errors; they land in the status
/// record while the last good content stays servable.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Every generation candidate failed; no report exists to show
    #[error("generation failed: {0}")]
    Generation(ChainExhausted),

    /// Every validation candidate failed (recorded, non-fatal to content)
    #[error("validation failed: {0}")]
    Validation(ChainExhausted),

    /// The fix chain failed (recorded, non-fatal to content)
    #[error("fix failed: {0}")]
    Fix(ChainExhausted),

    /// Fix output failed sanity checks; original content retained
    #[error("fix rejected: {reason}")]
    FixRejected { reason: String },

    /// Persistence failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

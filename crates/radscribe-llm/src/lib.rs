//! Model gateway: uniform call interface to any LLM provider.
//!
//! All providers implement the [`LlmBackend`] trait, so the orchestrator can
//! walk a candidate chain without knowing implementation details. The
//! gateway owns retry and timeout: every invocation carries a deadline that
//! escalates to a transient failure, and [`RetryingBackend`] applies the
//! transient-only exponential-backoff policy around any provider backend.

mod anthropic;
pub(crate) mod http;
mod openrouter;
mod retry;
mod types;

// Test seam; not part of public API stability guarantees.
#[doc(hidden)]
pub mod scripted;

pub use retry::RetryingBackend;
pub use types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};

pub use radscribe_util::error::LlmError;

pub(crate) use anthropic::AnthropicBackend;
pub(crate) use openrouter::OpenRouterBackend;

use radscribe_config::Config;

/// Construct a bare backend for a specific provider.
///
/// Does not apply the retry policy; callers that want the full gateway
/// behavior should use [`gateway_for_provider`].
///
/// # Errors
///
/// Returns `LlmError::Unsupported` if the provider is unknown and
/// `LlmError::Misconfiguration` if provider-specific configuration is
/// invalid (e.g. a missing API key variable).
pub fn backend_for_provider(
    provider: &str,
    config: &Config,
) -> Result<Box<dyn LlmBackend>, LlmError> {
    match provider {
        "anthropic" => {
            let backend = AnthropicBackend::new_from_config(config)?;
            Ok(Box::new(backend))
        }
        "openrouter" => {
            let backend = OpenRouterBackend::new_from_config(config)?;
            Ok(Box::new(backend))
        }
        unknown => Err(LlmError::Unsupported(format!(
            "Unknown LLM provider '{unknown}'. Supported providers: anthropic, openrouter."
        ))),
    }
}

/// Construct a retry-wrapped gateway backend for a provider.
///
/// # Errors
///
/// Propagates construction errors from [`backend_for_provider`].
pub fn gateway_for_provider(
    provider: &str,
    config: &Config,
) -> Result<Box<dyn LlmBackend>, LlmError> {
    let backend = backend_for_provider(provider, config)?;
    Ok(Box::new(RetryingBackend::from_config(
        backend,
        &config.retry,
    )))
}

//! Shared HTTP plumbing for provider backends.

use std::time::Duration;

use radscribe_util::error::LlmError;

/// Common per-invocation sampling parameters
#[derive(Debug, Clone)]
pub(crate) struct HttpParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for HttpParams {
    fn default() -> Self {
        Self {
            max_tokens: 2048,
            temperature: 0.2,
        }
    }
}

impl HttpParams {
    /// Resolve parameters from invocation metadata, falling back to defaults.
    pub(crate) fn from_metadata(
        metadata: &std::collections::HashMap<String, serde_json::Value>,
    ) -> Self {
        let defaults = Self::default();
        let max_tokens = metadata
            .get("max_tokens")
            .and_then(|v| v.as_u64())
            .map(|v| v as u32)
            .unwrap_or(defaults.max_tokens);
        let temperature = metadata
            .get("temperature")
            .and_then(|v| v.as_f64())
            .map(|v| v as f32)
            .unwrap_or(defaults.temperature);
        Self {
            max_tokens,
            temperature,
        }
    }
}

/// Build the shared HTTP client used by all backends.
pub(crate) fn build_client() -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .build()
        .map_err(|e| LlmError::Misconfiguration(format!("failed to build HTTP client: {e}")))
}

/// Map a reqwest send-level failure into the error taxonomy.
pub(crate) fn classify_send_error(
    provider: &str,
    err: &reqwest::Error,
    timeout: Duration,
) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout { duration: timeout }
    } else {
        LlmError::Transport(format!("{provider} request failed: {err}"))
    }
}

/// Map a non-success HTTP status into the error taxonomy.
///
/// 401/403 -> auth, 429 -> quota, 5xx -> outage, anything else -> transport.
pub(crate) fn classify_status(provider: &str, status: u16, body: &str) -> LlmError {
    let snippet: String = body.chars().take(200).collect();
    match status {
        401 | 403 => LlmError::ProviderAuth(format!("{provider} returned {status}: {snippet}")),
        429 => LlmError::ProviderQuota(format!("{provider} returned 429: {snippet}")),
        500..=599 => LlmError::ProviderOutage(format!("{provider} returned {status}: {snippet}")),
        other => LlmError::Transport(format!("{provider} returned {other}: {snippet}")),
    }
}

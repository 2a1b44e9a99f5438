//! OpenRouter HTTP backend (OpenAI-compatible chat completions).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use radscribe_util::error::LlmError;

use crate::http::{HttpParams, build_client, classify_send_error, classify_status};
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};

/// Default OpenRouter API endpoint
const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Referer header OpenRouter uses for app attribution
const DEFAULT_REFERER: &str = "https://github.com/radscribe/radscribe";

/// Title header OpenRouter uses for app attribution
const DEFAULT_TITLE: &str = "radscribe";

/// OpenRouter backend
#[derive(Clone)]
pub(crate) struct OpenRouterBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenRouterBackend {
    /// Create a new OpenRouter backend.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the HTTP client cannot be
    /// constructed.
    pub fn new(api_key: String, base_url: Option<String>) -> Result<Self, LlmError> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
        })
    }

    /// Create a backend from configuration, loading the API key from the
    /// configured environment variable.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the API key variable is not
    /// set.
    pub fn new_from_config(config: &radscribe_config::Config) -> Result<Self, LlmError> {
        let api_key_env = config
            .llm
            .openrouter
            .as_ref()
            .and_then(|o| o.api_key_env.as_deref())
            .unwrap_or("OPENROUTER_API_KEY");

        let api_key = std::env::var(api_key_env).map_err(|_| {
            LlmError::Misconfiguration(format!(
                "OpenRouter API key not found in environment variable '{api_key_env}'. \
                 Set this variable or configure a different api_key_env in [llm.openrouter]."
            ))
        })?;

        let base_url = config
            .llm
            .openrouter
            .as_ref()
            .and_then(|o| o.base_url.clone());

        Self::new(api_key, base_url)
    }

    /// Convert messages to the OpenAI-compatible format
    fn convert_messages(messages: &[Message]) -> Vec<OpenAiMessage> {
        messages
            .iter()
            .map(|msg| OpenAiMessage {
                role: match msg.role {
                    Role::System => "system".to_string(),
                    Role::User => "user".to_string(),
                    Role::Assistant => "assistant".to_string(),
                },
                content: msg.content.clone(),
            })
            .collect()
    }

    /// Optional provider-specific reasoning-effort hint, forwarded when the
    /// candidate carries one and otherwise omitted entirely.
    fn reasoning_from_metadata(
        metadata: &std::collections::HashMap<String, serde_json::Value>,
    ) -> Option<Reasoning> {
        metadata
            .get("reasoning_effort")
            .and_then(|v| v.as_str())
            .map(|effort| Reasoning {
                effort: effort.to_string(),
            })
    }
}

#[async_trait]
impl LlmBackend for OpenRouterBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let params = HttpParams::from_metadata(&inv.metadata);
        let reasoning = Self::reasoning_from_metadata(&inv.metadata);

        debug!(
            provider = "openrouter",
            model = %inv.model,
            task = %inv.task,
            max_tokens = params.max_tokens,
            temperature = params.temperature,
            reasoning = ?reasoning.as_ref().map(|r| r.effort.as_str()),
            timeout_secs = inv.timeout.as_secs(),
            "Invoking OpenRouter backend"
        );

        let request_body = OpenRouterRequest {
            model: inv.model.clone(),
            messages: Self::convert_messages(&inv.messages),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            stream: false,
            reasoning,
        };

        let started = Instant::now();
        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", DEFAULT_REFERER)
            .header("X-Title", DEFAULT_TITLE)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .timeout(inv.timeout)
            .send()
            .await
            .map_err(|e| classify_send_error("openrouter", &e, inv.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status("openrouter", status.as_u16(), &body));
        }

        let response_body: OpenRouterResponse = response.json().await.map_err(|e| {
            LlmError::Transport(format!("Failed to parse OpenRouter response: {e}"))
        })?;

        let choice = response_body.choices.first().ok_or_else(|| {
            LlmError::Transport("OpenRouter response missing choices[0]".to_string())
        })?;

        let content = choice.message.content.clone().ok_or_else(|| {
            LlmError::Transport("OpenRouter response missing content in choices[0]".to_string())
        })?;

        let mut result = LlmResult::new(content, "openrouter", inv.model)
            .with_latency_ms(started.elapsed().as_millis() as u64);

        if let Some(usage) = response_body.usage {
            result = result.with_tokens(usage.prompt_tokens, usage.completion_tokens);
        }

        debug!(
            provider = "openrouter",
            tokens_input = ?result.tokens_input,
            tokens_output = ?result.tokens_output,
            latency_ms = ?result.latency_ms,
            "OpenRouter invocation completed"
        );

        Ok(result)
    }
}

/// OpenAI-compatible message format for requests
#[derive(Debug, Clone, Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

/// OpenAI-compatible message format in responses
#[derive(Debug, Clone, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

/// Reasoning-effort hint in OpenRouter requests
#[derive(Debug, Clone, Serialize)]
struct Reasoning {
    effort: String,
}

/// OpenRouter request body (OpenAI-compatible)
#[derive(Debug, Clone, Serialize)]
struct OpenRouterRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning: Option<Reasoning>,
}

/// One choice in an OpenRouter response
#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: OpenAiResponseMessage,
}

/// Token usage information
#[derive(Debug, Clone, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

/// OpenRouter response body
#[derive(Debug, Clone, Deserialize)]
struct OpenRouterResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn convert_messages_maps_roles() {
        let messages = vec![Message::system("rules"), Message::user("report")];
        let converted = OpenRouterBackend::convert_messages(&messages);
        assert_eq!(converted[0].role, "system");
        assert_eq!(converted[1].role, "user");
    }

    #[test]
    fn reasoning_hint_forwarded_when_present() {
        let mut metadata = HashMap::new();
        metadata.insert(
            "reasoning_effort".to_string(),
            serde_json::json!("medium"),
        );
        let reasoning = OpenRouterBackend::reasoning_from_metadata(&metadata).unwrap();
        assert_eq!(reasoning.effort, "medium");

        assert!(OpenRouterBackend::reasoning_from_metadata(&HashMap::new()).is_none());
    }

    #[test]
    fn reasoning_field_omitted_from_request_when_absent() {
        let request = OpenRouterRequest {
            model: "openai/gpt-5-mini".to_string(),
            messages: vec![],
            max_tokens: 256,
            temperature: 0.2,
            stream: false,
            reasoning: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("reasoning"));

        let with_hint = OpenRouterRequest {
            reasoning: Some(Reasoning {
                effort: "high".to_string(),
            }),
            ..request
        };
        let json = serde_json::to_string(&with_hint).unwrap();
        assert!(json.contains(r#""reasoning":{"effort":"high"}"#));
    }
}

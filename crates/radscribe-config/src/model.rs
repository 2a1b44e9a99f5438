//! Configuration data model.

use serde::{Deserialize, Serialize};

use radscribe_util::types::{ModelCandidate, TaskKind};

use crate::ConfigError;

/// Top-level configuration for the pipeline
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Provider connection settings
    #[serde(default)]
    pub llm: LlmConfig,
    /// Candidate chains per task kind
    #[serde(default)]
    pub tasks: TaskChains,
    /// Gateway retry policy
    #[serde(default)]
    pub retry: RetryConfig,
    /// Execution mode and polling knobs
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` on syntax/type errors and
    /// `ConfigError::Invalid` when the parsed value violates a constraint
    /// (empty chains, fix chain arity, out-of-range temperature).
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Minimal configuration for unit tests: one scripted-friendly candidate
    /// per task, tiny retry delays.
    #[must_use]
    pub fn minimal_for_testing() -> Self {
        Config {
            llm: LlmConfig::default(),
            tasks: TaskChains {
                generate: vec![ModelCandidate::new("anthropic", "claude-sonnet-4-5")],
                validate: vec![ModelCandidate::new("anthropic", "claude-haiku-4-5")],
                fix: vec![ModelCandidate::new("anthropic", "claude-haiku-4-5")],
            },
            retry: RetryConfig {
                max_attempts: 3,
                base_delay_ms: 10,
            },
            pipeline: PipelineConfig::default(),
        }
    }
}

/// Provider connection settings.
///
/// Per-candidate model and sampling parameters live in the chains; this
/// section only carries what a backend needs to be constructed.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Anthropic Messages API settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic: Option<AnthropicConfig>,
    /// OpenRouter chat-completions settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openrouter: Option<OpenRouterConfig>,
}

/// Anthropic backend construction settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AnthropicConfig {
    /// Override for the Messages API endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Environment variable holding the API key (default ANTHROPIC_API_KEY)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

/// OpenRouter backend construction settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OpenRouterConfig {
    /// Override for the chat-completions endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Environment variable holding the API key (default OPENROUTER_API_KEY)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

/// Ordered candidate chains, one per task kind
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TaskChains {
    /// Generation: primary + fallbacks
    #[serde(default)]
    pub generate: Vec<ModelCandidate>,
    /// Validation: primary + fallbacks
    #[serde(default)]
    pub validate: Vec<ModelCandidate>,
    /// Fix-applier: exactly one candidate
    #[serde(default)]
    pub fix: Vec<ModelCandidate>,
}

impl TaskChains {
    /// Chain for a task kind, in fallback order
    #[must_use]
    pub fn chain(&self, task: TaskKind) -> &[ModelCandidate] {
        match task {
            TaskKind::Generate => &self.generate,
            TaskKind::Validate => &self.validate,
            TaskKind::Fix => &self.fix,
        }
    }
}

/// Gateway retry policy for transient failures
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Total attempts per candidate, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Backoff base delay in milliseconds, doubled per attempt
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

/// How the validation+fix portion of the pipeline runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Caller awaits generate -> validate -> (conditional) fix in one round trip
    #[default]
    Sync,
    /// Caller gets the draft immediately; validate+fix run as a detached task
    Async,
}

/// Execution mode and polling knobs
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Sync or async validation+fix
    #[serde(default)]
    pub mode: ExecutionMode,
    /// Per-invocation model call timeout in seconds
    #[serde(default = "default_invoke_timeout_secs")]
    pub invoke_timeout_secs: u64,
    /// Bounded wait for `await_terminal` in seconds
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
    /// Poll interval for `await_terminal` in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_invoke_timeout_secs() -> u64 {
    120
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    250
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::default(),
            invoke_timeout_secs: default_invoke_timeout_secs(),
            poll_timeout_secs: default_poll_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

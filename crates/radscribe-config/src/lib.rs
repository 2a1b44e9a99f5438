//! Configuration for radscribe pipelines.
//!
//! The task -> candidate-chain mapping is the only externally tunable policy:
//! chains are data, not code, so primaries and fallbacks can be reshuffled
//! without touching pipeline logic. Configuration is parsed once, validated,
//! and injected; there is no process-wide mutable model mapping.

mod discovery;
mod model;
mod validation;

pub use discovery::{CONFIG_ENV_VAR, CONFIG_FILE_NAME, discover};
pub use model::{
    AnthropicConfig, Config, ExecutionMode, LlmConfig, OpenRouterConfig, PipelineConfig,
    RetryConfig, TaskChains,
};

use thiserror::Error;

/// Errors from configuration loading and validation
#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML syntax or type error
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// Configured file path does not exist or is unreadable
    #[error("configuration file not found: {0}")]
    NotFound(String),

    /// Structurally valid TOML that violates a pipeline constraint
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

//! Fallback orchestration across a task's candidate chain.
//!
//! The runner walks the configured chain in order. A candidate is left
//! behind for exactly two reasons: the gateway returned an error (transient
//! failures have already consumed their retry budget inside the gateway),
//! or its output failed to parse. Parse failures never re-invoke the same
//! candidate. When no candidate is left, every attempt's failure reason is
//! aggregated into [`ChainExhausted`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::{debug, warn};

use radscribe_config::{Config, TaskChains};
use radscribe_llm::{LlmBackend, LlmInvocation, LlmResult, Message, gateway_for_provider};
use radscribe_util::error::{AttemptFailure, ChainExhausted, LlmError, ParseError};
use radscribe_util::types::{ModelCandidate, TaskKind};

/// Produces a gateway backend for a candidate.
///
/// The production implementation builds retry-wrapped HTTP backends from
/// configuration; tests inject scripted doubles through the same seam.
pub trait BackendFactory: Send + Sync {
    /// Resolve the backend serving this candidate's provider.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Unsupported` or `LlmError::Misconfiguration` when
    /// the provider cannot be constructed; the runner records the failure
    /// and advances to the next candidate.
    fn backend_for(&self, candidate: &ModelCandidate) -> Result<Arc<dyn LlmBackend>, LlmError>;
}

/// Factory backed by provider configuration
pub struct ConfigBackendFactory {
    config: Config,
}

impl ConfigBackendFactory {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl BackendFactory for ConfigBackendFactory {
    fn backend_for(&self, candidate: &ModelCandidate) -> Result<Arc<dyn LlmBackend>, LlmError> {
        gateway_for_provider(&candidate.provider, &self.config).map(Arc::from)
    }
}

/// Factory over a fixed provider -> backend map. Test seam; not part of
/// public API stability guarantees.
#[doc(hidden)]
#[derive(Default)]
pub struct ProviderMapFactory {
    backends: HashMap<String, Arc<dyn LlmBackend>>,
}

#[doc(hidden)]
impl ProviderMapFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_backend(
        mut self,
        provider: impl Into<String>,
        backend: Arc<dyn LlmBackend>,
    ) -> Self {
        self.backends.insert(provider.into(), backend);
        self
    }
}

impl BackendFactory for ProviderMapFactory {
    fn backend_for(&self, candidate: &ModelCandidate) -> Result<Arc<dyn LlmBackend>, LlmError> {
        self.backends.get(&candidate.provider).cloned().ok_or_else(|| {
            LlmError::Unsupported(format!("no backend mapped for '{}'", candidate.provider))
        })
    }
}

/// A successful chain run: the parsed value plus the raw gateway result
/// that produced it.
#[derive(Debug)]
pub struct Completion<T> {
    /// Parsed payload
    pub value: T,
    /// Gateway result (provider, model used, token counts, latency)
    pub result: LlmResult,
}

/// Walks candidate chains with parse-aware fallback.
///
/// Chains are injected configuration data, immutable for the runner's
/// lifetime. The runner holds no per-call state, so one instance serves
/// any number of concurrent pipelines.
pub struct FallbackRunner {
    chains: TaskChains,
    factory: Arc<dyn BackendFactory>,
    invoke_timeout: Duration,
}

impl FallbackRunner {
    #[must_use]
    pub fn new(
        chains: TaskChains,
        factory: Arc<dyn BackendFactory>,
        invoke_timeout: Duration,
    ) -> Self {
        Self {
            chains,
            factory,
            invoke_timeout,
        }
    }

    /// Build a runner from configuration, using the given factory
    #[must_use]
    pub fn from_config(config: &Config, factory: Arc<dyn BackendFactory>) -> Self {
        Self::new(
            config.tasks.clone(),
            factory,
            Duration::from_secs(config.pipeline.invoke_timeout_secs),
        )
    }

    /// Run a task's chain until one candidate yields a parseable completion.
    ///
    /// `temperature_override`, when set, replaces every candidate's
    /// configured temperature (the validation stage forces a low one).
    ///
    /// # Errors
    ///
    /// Returns [`ChainExhausted`] carrying one [`AttemptFailure`] per
    /// attempted candidate when the whole chain fails.
    pub async fn run_parsed<T, F>(
        &self,
        report_id: &str,
        task: TaskKind,
        system_prompt: &str,
        user_prompt: &str,
        temperature_override: Option<f32>,
        parse: F,
    ) -> Result<Completion<T>, ChainExhausted>
    where
        F: Fn(&str) -> Result<T, ParseError>,
    {
        let chain = self.chains.chain(task);
        let mut attempts = Vec::with_capacity(chain.len());

        for candidate in chain {
            let backend = match self.factory.backend_for(candidate) {
                Ok(backend) => backend,
                Err(err) => {
                    warn!(
                        report_id,
                        task = %task,
                        provider = %candidate.provider,
                        model = %candidate.model,
                        error = %err,
                        "backend construction failed, advancing to next candidate"
                    );
                    attempts.push(AttemptFailure {
                        provider: candidate.provider.clone(),
                        model: candidate.model.clone(),
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            let invocation = self.build_invocation(
                report_id,
                task,
                candidate,
                system_prompt,
                user_prompt,
                temperature_override,
            );

            match backend.invoke(invocation).await {
                Ok(result) => match parse(&result.raw_response) {
                    Ok(value) => {
                        debug!(
                            report_id,
                            task = %task,
                            provider = %result.provider,
                            model = %result.model_used,
                            latency_ms = result.latency_ms,
                            "candidate succeeded"
                        );
                        return Ok(Completion { value, result });
                    }
                    Err(parse_err) => {
                        warn!(
                            report_id,
                            task = %task,
                            provider = %candidate.provider,
                            model = %candidate.model,
                            error = %parse_err,
                            "unparseable completion, advancing to next candidate"
                        );
                        attempts.push(AttemptFailure {
                            provider: candidate.provider.clone(),
                            model: candidate.model.clone(),
                            reason: parse_err.to_string(),
                        });
                    }
                },
                Err(err) => {
                    warn!(
                        report_id,
                        task = %task,
                        provider = %candidate.provider,
                        model = %candidate.model,
                        error = %err,
                        "candidate failed, advancing to next candidate"
                    );
                    attempts.push(AttemptFailure {
                        provider: candidate.provider.clone(),
                        model: candidate.model.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        Err(ChainExhausted { task, attempts })
    }

    fn build_invocation(
        &self,
        report_id: &str,
        task: TaskKind,
        candidate: &ModelCandidate,
        system_prompt: &str,
        user_prompt: &str,
        temperature_override: Option<f32>,
    ) -> LlmInvocation {
        let temperature = temperature_override.unwrap_or(candidate.temperature);
        let mut invocation = LlmInvocation::new(
            report_id,
            task,
            &candidate.model,
            self.invoke_timeout,
            vec![
                Message::system(system_prompt),
                Message::user(user_prompt),
            ],
        )
        .with_metadata("temperature", json!(temperature))
        .with_metadata("max_tokens", json!(candidate.max_tokens));

        if let Some(effort) = &candidate.reasoning_effort {
            invocation = invocation.with_metadata("reasoning_effort", json!(effort));
        }
        invocation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radscribe_llm::scripted::ScriptedBackend;

    fn runner_with(
        chain: Vec<ModelCandidate>,
        factory: ProviderMapFactory,
    ) -> FallbackRunner {
        let chains = TaskChains {
            generate: chain,
            validate: Vec::new(),
            fix: Vec::new(),
        };
        FallbackRunner::new(chains, Arc::new(factory), Duration::from_secs(5))
    }

    fn parse_identity(raw: &str) -> Result<String, ParseError> {
        if raw.trim().is_empty() {
            return Err(ParseError::MissingPayload("empty".to_string()));
        }
        Ok(raw.to_string())
    }

    #[tokio::test]
    async fn first_healthy_candidate_wins() {
        let primary = Arc::new(ScriptedBackend::new("primary").with_ok("payload"));
        let fallback = Arc::new(ScriptedBackend::new("fallback").with_ok("unused"));
        let factory = ProviderMapFactory::new()
            .with_backend("primary", primary.clone())
            .with_backend("fallback", fallback.clone());
        let runner = runner_with(
            vec![
                ModelCandidate::new("primary", "model-a"),
                ModelCandidate::new("fallback", "model-b"),
            ],
            factory,
        );

        let completion = runner
            .run_parsed("rep-1", TaskKind::Generate, "sys", "user", None, parse_identity)
            .await
            .unwrap();

        assert_eq!(completion.value, "payload");
        assert_eq!(primary.call_count(), 1);
        assert_eq!(fallback.call_count(), 0);
    }

    #[tokio::test]
    async fn parse_failure_advances_without_reinvoking() {
        let primary = Arc::new(ScriptedBackend::new("primary").with_ok("   "));
        let fallback = Arc::new(ScriptedBackend::new("fallback").with_ok("good"));
        let factory = ProviderMapFactory::new()
            .with_backend("primary", primary.clone())
            .with_backend("fallback", fallback.clone());
        let runner = runner_with(
            vec![
                ModelCandidate::new("primary", "model-a"),
                ModelCandidate::new("fallback", "model-b"),
            ],
            factory,
        );

        let completion = runner
            .run_parsed("rep-1", TaskKind::Generate, "sys", "user", None, parse_identity)
            .await
            .unwrap();

        assert_eq!(completion.value, "good");
        // Unparseable output costs exactly one call against that candidate
        assert_eq!(primary.call_count(), 1);
        assert_eq!(fallback.call_count(), 1);
    }

    #[tokio::test]
    async fn exhausted_chain_reports_every_attempt() {
        let primary =
            Arc::new(ScriptedBackend::new("primary").with_err(LlmError::ProviderOutage("503".into())));
        let fallback = Arc::new(
            ScriptedBackend::new("fallback").with_err(LlmError::ProviderAuth("401".into())),
        );
        let factory = ProviderMapFactory::new()
            .with_backend("primary", primary)
            .with_backend("fallback", fallback);
        let runner = runner_with(
            vec![
                ModelCandidate::new("primary", "model-a"),
                ModelCandidate::new("fallback", "model-b"),
            ],
            factory,
        );

        let err = runner
            .run_parsed("rep-1", TaskKind::Generate, "sys", "user", None, parse_identity)
            .await
            .unwrap_err();

        assert_eq!(err.attempts.len(), 2);
        let rendered = err.to_string();
        assert!(rendered.contains("model-a"));
        assert!(rendered.contains("model-b"));
        assert!(rendered.contains("503"));
        assert!(rendered.contains("401"));
    }

    #[tokio::test]
    async fn temperature_override_applies_to_every_candidate() {
        let primary = Arc::new(ScriptedBackend::new("primary").with_ok("payload"));
        let factory = ProviderMapFactory::new().with_backend("primary", primary.clone());
        let runner = runner_with(
            vec![ModelCandidate::new("primary", "model-a").with_temperature(0.9)],
            factory,
        );

        runner
            .run_parsed("rep-1", TaskKind::Generate, "sys", "user", Some(0.1), parse_identity)
            .await
            .unwrap();

        let invocations = primary.invocations();
        assert_eq!(invocations[0].metadata["temperature"], json!(0.1));
    }

    #[tokio::test]
    async fn unmapped_provider_recorded_as_attempt() {
        let fallback = Arc::new(ScriptedBackend::new("fallback").with_ok("good"));
        let factory = ProviderMapFactory::new().with_backend("fallback", fallback);
        let runner = runner_with(
            vec![
                ModelCandidate::new("missing", "model-a"),
                ModelCandidate::new("fallback", "model-b"),
            ],
            factory,
        );

        let completion = runner
            .run_parsed("rep-1", TaskKind::Generate, "sys", "user", None, parse_identity)
            .await
            .unwrap();
        assert_eq!(completion.value, "good");
    }
}

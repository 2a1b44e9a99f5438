//! Shared fixtures for the pipeline integration tests: scripted backends
//! wired through the factory seam, in-memory stores, and canned payloads.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use radscribe::config::{PipelineConfig, TaskChains};
use radscribe::engine::{FallbackRunner, GenerationRequest, ProviderMapFactory, ReportPipeline};
use radscribe::store::{MemoryStore, StatusStore, VersionStore};
use radscribe::types::ModelCandidate;

/// A pipeline over injected scripted backends plus direct store access
pub struct Harness {
    pub pipeline: ReportPipeline,
    pub store: Arc<MemoryStore>,
}

/// Build a pipeline from explicit chains and a provider map
pub fn harness(
    chains: TaskChains,
    factory: ProviderMapFactory,
    settings: PipelineConfig,
) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let runner = Arc::new(FallbackRunner::new(
        chains,
        Arc::new(factory),
        Duration::from_secs(5),
    ));
    let pipeline = ReportPipeline::new(runner, store.clone(), store.clone(), settings);
    Harness { pipeline, store }
}

/// Build a pipeline over caller-supplied stores (for the filesystem store)
pub fn harness_with_stores(
    chains: TaskChains,
    factory: ProviderMapFactory,
    settings: PipelineConfig,
    status: Arc<dyn StatusStore>,
    versions: Arc<dyn VersionStore>,
) -> ReportPipeline {
    let runner = Arc::new(FallbackRunner::new(
        chains,
        Arc::new(factory),
        Duration::from_secs(5),
    ));
    ReportPipeline::new(runner, status, versions, settings)
}

/// One candidate per task, each on its own provider key
pub fn single_candidate_chains() -> TaskChains {
    TaskChains {
        generate: vec![ModelCandidate::new("gen", "gen-model")],
        validate: vec![ModelCandidate::new("val", "val-model")],
        fix: vec![ModelCandidate::new("fix", "fix-model")],
    }
}

/// Fast polling knobs for tests
pub fn fast_settings(mode: radscribe::config::ExecutionMode) -> PipelineConfig {
    PipelineConfig {
        mode,
        invoke_timeout_secs: 5,
        poll_timeout_secs: 2,
        poll_interval_ms: 10,
    }
}

/// Canned generation payload in the expected JSON shape
pub fn generation_payload(report_content: &str, description: &str) -> String {
    serde_json::json!({
        "report_content": report_content,
        "description": description,
        "scan_type": "CT chest",
    })
    .to_string()
}

/// Canned validation payload with a single violation
pub fn violation_payload(location: &str, issue: &str, fix: &str) -> String {
    serde_json::json!({
        "violations": [{"location": location, "issue": issue, "fix": fix}],
    })
    .to_string()
}

/// Validation payload with no violations
pub const CLEAN_VALIDATION: &str = r#"{"violations": []}"#;

/// A generation request with a recognizable signature
pub fn request(report_id: &str) -> GenerationRequest {
    GenerationRequest {
        report_id: report_id.to_string(),
        system_prompt: "Write a structured radiology report.\n{{signature}}".to_string(),
        user_prompt: "FINDINGS: 4cm RUL mass".to_string(),
        signature: "Dr. A. Example, MD".to_string(),
        findings: Some("4cm RUL mass".to_string()),
    }
}

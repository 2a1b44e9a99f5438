//! End-to-end pipeline scenarios over scripted backends.

mod support;

use std::sync::Arc;

use radscribe::config::{ExecutionMode, TaskChains};
use radscribe::engine::ProviderMapFactory;
use radscribe::error::{LlmError, PipelineError};
use radscribe::llm::RetryingBackend;
use radscribe::llm::scripted::ScriptedBackend;
use radscribe::store::VersionStore;
use radscribe::types::{ModelCandidate, ValidationState, VersionTag};

use support::{
    CLEAN_VALIDATION, fast_settings, generation_payload, harness, request, single_candidate_chains,
    violation_payload,
};

const HEALTHY_REPORT: &str =
    "FINDINGS:\nThere is a 4 cm mass in the right upper lobe.\n\nIMPRESSION:\n- Right upper lobe mass, biopsy recommended.";

#[tokio::test]
async fn healthy_primary_yields_signed_valid_report() {
    // Scenario: healthy generation primary, clean validation.
    let r#gen = Arc::new(ScriptedBackend::new("gen").with_ok(generation_payload(
        HEALTHY_REPORT,
        "Four centimeter right upper lobe mass needing biopsy",
    )));
    let val = Arc::new(ScriptedBackend::new("val").with_ok(CLEAN_VALIDATION));
    let fix = Arc::new(ScriptedBackend::new("fix"));
    let factory = ProviderMapFactory::new()
        .with_backend("gen", r#gen)
        .with_backend("val", val)
        .with_backend("fix", fix.clone());
    let h = harness(
        single_candidate_chains(),
        factory,
        fast_settings(ExecutionMode::Sync),
    );

    let outcome = h.pipeline.generate_report(request("rep-a")).await.unwrap();

    let words = outcome.description.split_whitespace().count();
    assert!((5..=15).contains(&words));
    assert!(outcome.description.chars().count() <= 150);
    assert!(outcome.content.ends_with("Dr. A. Example, MD"));
    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.status.state, ValidationState::Valid);
    assert_eq!(outcome.status.violations_count, 0);
    assert_eq!(fix.call_count(), 0);

    let versions = h.store.list("rep-a").unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].tag, VersionTag::Initial);
}

#[tokio::test]
async fn duplicated_finding_is_fixed_exactly_once() {
    // Scenario: the same negative finding appears twice; the validator
    // flags the duplication and the fix stage runs once.
    let duplicated =
        "FINDINGS:\nThe adrenal glands are unremarkable. The adrenal glands are unremarkable.\n\nIMPRESSION:\n- No acute abnormality.";
    let deduplicated =
        "FINDINGS:\nThe adrenal glands are unremarkable.\n\nIMPRESSION:\n- No acute abnormality.";

    let r#gen = Arc::new(ScriptedBackend::new("gen").with_ok(generation_payload(
        duplicated,
        "Unremarkable abdominal CT without any acute abnormality",
    )));
    let val = Arc::new(ScriptedBackend::new("val").with_ok(violation_payload(
        "FINDINGS",
        "the adrenal glands sentence is duplicated",
        "remove the second occurrence of the sentence",
    )));
    let fix = Arc::new(ScriptedBackend::new("fix").with_ok(format!(
        "{deduplicated}\n\nDr. A. Example, MD"
    )));
    let factory = ProviderMapFactory::new()
        .with_backend("gen", r#gen)
        .with_backend("val", val.clone())
        .with_backend("fix", fix.clone());
    let h = harness(
        single_candidate_chains(),
        factory,
        fast_settings(ExecutionMode::Sync),
    );

    let outcome = h.pipeline.generate_report(request("rep-b")).await.unwrap();

    assert_eq!(fix.call_count(), 1);
    assert_eq!(outcome.status.state, ValidationState::Fixed);
    assert_eq!(outcome.status.violations_count, 1);
    assert_eq!(
        outcome
            .content
            .matches("The adrenal glands are unremarkable.")
            .count(),
        1
    );

    // Exactly one new version per successful fix, linked to the draft
    let versions = h.store.list("rep-b").unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0].tag, VersionTag::Initial);
    assert_eq!(versions[1].tag, VersionTag::Fixed);
    assert_eq!(versions[1].predecessor, Some(versions[0].number));

    // The fix prompt carried the prescribed fix text
    let fix_prompt = &fix.invocations()[0].messages[1].content;
    assert!(fix_prompt.contains("remove the second occurrence"));
}

#[tokio::test]
async fn exhausted_generation_chain_is_fatal_and_persists_nothing() {
    // Scenario: primary and fallback generation candidates both exhaust
    // their transient retry budgets.
    let primary = Arc::new(
        ScriptedBackend::new("gen-primary")
            .with_err(LlmError::ProviderOutage("503".into()))
            .with_err(LlmError::ProviderOutage("503".into())),
    );
    let fallback = Arc::new(
        ScriptedBackend::new("gen-fallback")
            .with_err(LlmError::Transport("connection reset".into()))
            .with_err(LlmError::Transport("connection reset".into())),
    );
    let retried_primary: Arc<dyn radscribe::llm::LlmBackend> = Arc::new(RetryingBackend::new(
        Box::new(primary.clone()),
        2,
        std::time::Duration::from_millis(1),
    ));
    let retried_fallback: Arc<dyn radscribe::llm::LlmBackend> = Arc::new(RetryingBackend::new(
        Box::new(fallback.clone()),
        2,
        std::time::Duration::from_millis(1),
    ));

    let chains = TaskChains {
        generate: vec![
            ModelCandidate::new("gen-primary", "model-a"),
            ModelCandidate::new("gen-fallback", "model-b"),
        ],
        validate: vec![ModelCandidate::new("val", "val-model")],
        fix: vec![ModelCandidate::new("fix", "fix-model")],
    };
    let factory = ProviderMapFactory::new()
        .with_backend("gen-primary", retried_primary)
        .with_backend("gen-fallback", retried_fallback)
        .with_backend("val", Arc::new(ScriptedBackend::new("val")))
        .with_backend("fix", Arc::new(ScriptedBackend::new("fix")));
    let h = harness(chains, factory, fast_settings(ExecutionMode::Sync));

    let err = h.pipeline.generate_report(request("rep-c")).await.unwrap_err();

    match err {
        PipelineError::Generation(exhausted) => {
            assert_eq!(exhausted.attempts.len(), 2);
            let rendered = exhausted.to_string();
            assert!(rendered.contains("model-a"));
            assert!(rendered.contains("model-b"));
        }
        other => panic!("expected a fatal generation error, got {other}"),
    }

    // Each candidate consumed its full retry budget
    assert_eq!(primary.call_count(), 2);
    assert_eq!(fallback.call_count(), 2);

    assert!(h.store.list("rep-c").unwrap().is_empty());
    assert!(h.pipeline.get_validation_status("rep-c").unwrap().is_none());
}

#[tokio::test]
async fn validation_falls_back_past_parse_failure_without_fixing() {
    // Scenario: validation primary returns prose, fallback returns a clean
    // result; no fix runs and the status is valid.
    let r#gen = Arc::new(ScriptedBackend::new("gen").with_ok(generation_payload(
        HEALTHY_REPORT,
        "Four centimeter right upper lobe mass needing biopsy",
    )));
    let val_primary =
        Arc::new(ScriptedBackend::new("val-primary").with_ok("The report looks fine to me."));
    let val_fallback = Arc::new(ScriptedBackend::new("val-fallback").with_ok(CLEAN_VALIDATION));
    let fix = Arc::new(ScriptedBackend::new("fix"));

    let chains = TaskChains {
        generate: vec![ModelCandidate::new("gen", "gen-model")],
        validate: vec![
            ModelCandidate::new("val-primary", "val-a"),
            ModelCandidate::new("val-fallback", "val-b"),
        ],
        fix: vec![ModelCandidate::new("fix", "fix-model")],
    };
    let factory = ProviderMapFactory::new()
        .with_backend("gen", r#gen)
        .with_backend("val-primary", val_primary.clone())
        .with_backend("val-fallback", val_fallback.clone())
        .with_backend("fix", fix.clone());
    let h = harness(chains, factory, fast_settings(ExecutionMode::Sync));

    let outcome = h.pipeline.generate_report(request("rep-d")).await.unwrap();

    assert_eq!(outcome.status.state, ValidationState::Valid);
    // Parse failure costs a single call before the fallback takes over
    assert_eq!(val_primary.call_count(), 1);
    assert_eq!(val_fallback.call_count(), 1);
    assert_eq!(fix.call_count(), 0);
}

#[tokio::test]
async fn rejected_fix_keeps_original_and_records_error() {
    let r#gen = Arc::new(ScriptedBackend::new("gen").with_ok(generation_payload(
        HEALTHY_REPORT,
        "Four centimeter right upper lobe mass needing biopsy",
    )));
    let val = Arc::new(ScriptedBackend::new("val").with_ok(violation_payload(
        "IMPRESSION",
        "too many bullets",
        "merge the bullets",
    )));
    // The fix model drops the IMPRESSION section entirely
    let fix = Arc::new(ScriptedBackend::new("fix").with_ok("FINDINGS:\nRewritten."));
    let factory = ProviderMapFactory::new()
        .with_backend("gen", r#gen)
        .with_backend("val", val)
        .with_backend("fix", fix);
    let h = harness(
        single_candidate_chains(),
        factory,
        fast_settings(ExecutionMode::Sync),
    );

    let outcome = h.pipeline.generate_report(request("rep-e")).await.unwrap();

    assert_eq!(outcome.status.state, ValidationState::Error);
    assert_eq!(outcome.status.violations_count, 1);
    assert!(outcome.status.error.as_deref().unwrap().contains("fix rejected"));
    // Original draft retained as the only version
    assert!(outcome.content.contains("right upper lobe"));
    let versions = h.store.list("rep-e").unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].tag, VersionTag::Initial);
}

#[tokio::test]
async fn exhausted_validation_chain_leaves_content_servable() {
    let r#gen = Arc::new(ScriptedBackend::new("gen").with_ok(generation_payload(
        HEALTHY_REPORT,
        "Four centimeter right upper lobe mass needing biopsy",
    )));
    let val = Arc::new(
        ScriptedBackend::new("val").with_err(LlmError::ProviderOutage("503".into())),
    );
    let fix = Arc::new(ScriptedBackend::new("fix"));
    let factory = ProviderMapFactory::new()
        .with_backend("gen", r#gen)
        .with_backend("val", val)
        .with_backend("fix", fix.clone());
    let h = harness(
        single_candidate_chains(),
        factory,
        fast_settings(ExecutionMode::Sync),
    );

    let outcome = h.pipeline.generate_report(request("rep-f")).await.unwrap();

    assert_eq!(outcome.status.state, ValidationState::Error);
    assert!(outcome.content.contains("right upper lobe"));
    assert_eq!(fix.call_count(), 0);
    // The draft remains the servable version
    let versions = h.store.list("rep-f").unwrap();
    assert_eq!(versions.len(), 1);
}

//! Validation stage: structure review against the fixed rule set.

use std::sync::Arc;

use tracing::info;

use radscribe_util::error::ChainExhausted;
use radscribe_util::types::{StructureValidationResult, TaskKind};

use crate::orchestrator::FallbackRunner;
use crate::parse::parse_validation_result;
use crate::prompts::{validation_system_prompt, validation_user_prompt};

/// Temperature forced on every validate candidate, regardless of the
/// configured value. Near-deterministic sampling keeps violation detection
/// stable across runs.
pub const VALIDATION_TEMPERATURE: f32 = 0.1;

/// Drives the validate chain over finalized report content
pub struct ValidationStage {
    runner: Arc<FallbackRunner>,
}

impl ValidationStage {
    #[must_use]
    pub fn new(runner: Arc<FallbackRunner>) -> Self {
        Self { runner }
    }

    /// Review the report against the structure rules.
    ///
    /// # Errors
    ///
    /// Returns [`ChainExhausted`] when every validate candidate fails. The
    /// pipeline records this on the status record; the content itself stays
    /// untouched and servable.
    pub async fn run(
        &self,
        report_id: &str,
        report_content: &str,
        scan_type: Option<&str>,
        findings: Option<&str>,
    ) -> Result<StructureValidationResult, ChainExhausted> {
        let system_prompt = validation_system_prompt();
        let user_prompt = validation_user_prompt(report_content, scan_type, findings);

        let completion = self
            .runner
            .run_parsed(
                report_id,
                TaskKind::Validate,
                &system_prompt,
                &user_prompt,
                Some(VALIDATION_TEMPERATURE),
                parse_validation_result,
            )
            .await?;

        info!(
            report_id,
            violations = completion.value.violations.len(),
            provider = %completion.result.provider,
            model = %completion.result.model_used,
            "structure review finished"
        );
        Ok(completion.value)
    }
}

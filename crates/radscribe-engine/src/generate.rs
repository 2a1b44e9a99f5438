//! Generation stage: rendered prompt in, signed report draft out.
//!
//! Prompt rendering happens upstream; this stage receives the final
//! system+user pair with variables already substituted. Its own concerns
//! are the signature (stripped from the prompts, appended to the output)
//! and the strict parse of the model's JSON payload.

use std::sync::Arc;

use tracing::{info, warn};

use radscribe_util::error::ChainExhausted;
use radscribe_util::types::TaskKind;

use crate::orchestrator::FallbackRunner;
use crate::parse::parse_report_output;
use crate::prompts::{generation_system_prompt, strip_signature_placeholder};

/// Input to one generation run
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Report id for persistence and log correlation
    pub report_id: String,
    /// Rendered system prompt (may still contain the signature placeholder)
    pub system_prompt: String,
    /// Rendered user prompt (may still contain the signature placeholder)
    pub user_prompt: String,
    /// Signature text appended verbatim to the generated report
    pub signature: String,
    /// Findings context forwarded to the validation stage
    pub findings: Option<String>,
}

/// A generated, signed draft ready for persistence and validation
#[derive(Debug, Clone)]
pub struct GeneratedDraft {
    /// Report body with the signature appended
    pub content: String,
    /// Courtesy one-line summary from the model
    pub description: String,
    /// Scan type inferred by the model, when determinable
    pub scan_type: Option<String>,
    /// Advisory warnings (description bounds)
    pub warnings: Vec<String>,
    /// Provider that produced the draft
    pub provider: String,
    /// Model that produced the draft
    pub model_used: String,
}

/// Drives the generate chain and post-processes its output
pub struct GenerationStage {
    runner: Arc<FallbackRunner>,
}

impl GenerationStage {
    #[must_use]
    pub fn new(runner: Arc<FallbackRunner>) -> Self {
        Self { runner }
    }

    /// Generate a signed draft.
    ///
    /// # Errors
    ///
    /// Returns [`ChainExhausted`] when every generate candidate fails; the
    /// caller treats this as fatal and persists nothing.
    pub async fn run(&self, request: &GenerationRequest) -> Result<GeneratedDraft, ChainExhausted> {
        // The model never sees the signature; exact reproduction is
        // guaranteed by appending the stored text after generation.
        let system_prompt =
            generation_system_prompt(&strip_signature_placeholder(&request.system_prompt));
        let user_prompt = strip_signature_placeholder(&request.user_prompt);

        let completion = self
            .runner
            .run_parsed(
                &request.report_id,
                TaskKind::Generate,
                &system_prompt,
                &user_prompt,
                None,
                parse_report_output,
            )
            .await?;

        let output = completion.value;
        let mut warnings = Vec::new();
        if let Some(warning) = output.description_bounds_warning() {
            warn!(
                report_id = %request.report_id,
                warning = %warning,
                "description outside advisory bounds"
            );
            warnings.push(warning);
        }

        let content = format!(
            "{}\n\n{}",
            output.report_content.trim_end(),
            request.signature
        );

        info!(
            report_id = %request.report_id,
            provider = %completion.result.provider,
            model = %completion.result.model_used,
            "draft generated"
        );

        Ok(GeneratedDraft {
            content,
            description: output.description,
            scan_type: output.scan_type,
            warnings,
            provider: completion.result.provider,
            model_used: completion.result.model_used,
        })
    }
}

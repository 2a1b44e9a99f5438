//! Fix stage: rewrite a report per a list of prescribed fixes.
//!
//! Invoked only when violations exist. The fix chain holds a single
//! candidate (enforced at config load), and the model's output must pass a
//! sanity gate before it replaces anything: a failed fix must never degrade
//! content that was already good enough to serve.

use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use radscribe_util::error::PipelineError;
use radscribe_util::types::{StructureViolation, TaskKind};

use crate::orchestrator::FallbackRunner;
use crate::parse::parse_fix_output;
use crate::prompts::{fix_system_prompt, fix_user_prompt};

// Section markers the gate requires the fixed output to preserve:
// ALL-CAPS heading lines ("FINDINGS:"), bold markdown headers
// ("**Findings**"), and markdown headings ("## Findings").
static CAPS_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[A-Z][A-Z0-9 /&'\-]{2,}:").unwrap());
static BOLD_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\*\*[^*\n]+\*\*:?\s*$").unwrap());
static MD_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,6}\s+\S.*$").unwrap());

/// Section markers found in a report body, in document order
fn section_markers(content: &str) -> Vec<String> {
    let mut markers = Vec::new();
    for regex in [&*CAPS_HEADING, &*BOLD_HEADING, &*MD_HEADING] {
        for found in regex.find_iter(content) {
            markers.push(found.as_str().trim().to_string());
        }
    }
    markers
}

/// Check a fix output against the original content.
///
/// Returns the rejection reason when the output is empty or drops a section
/// marker the original carried.
fn sanity_gate(original: &str, fixed: &str) -> Option<String> {
    if fixed.trim().is_empty() {
        return Some("fix output is empty".to_string());
    }
    for marker in section_markers(original) {
        if !fixed.contains(&marker) {
            return Some(format!("fix output dropped section marker '{marker}'"));
        }
    }
    None
}

/// Drives the single fix candidate and gates its output
pub struct FixStage {
    runner: Arc<FallbackRunner>,
}

impl FixStage {
    #[must_use]
    pub fn new(runner: Arc<FallbackRunner>) -> Self {
        Self { runner }
    }

    /// Apply the prescribed fixes to the report.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Fix` when the fix candidate fails and
    /// `PipelineError::FixRejected` when its output fails the sanity gate.
    /// In both cases the caller retains the original content.
    pub async fn run(
        &self,
        report_id: &str,
        report_content: &str,
        violations: &[StructureViolation],
    ) -> Result<String, PipelineError> {
        let system_prompt = fix_system_prompt();
        let user_prompt = fix_user_prompt(report_content, violations);

        let completion = self
            .runner
            .run_parsed(
                report_id,
                TaskKind::Fix,
                &system_prompt,
                &user_prompt,
                None,
                parse_fix_output,
            )
            .await
            .map_err(PipelineError::Fix)?;

        let fixed = completion.value;
        if let Some(reason) = sanity_gate(report_content, &fixed) {
            warn!(report_id, reason = %reason, "fix output rejected, keeping original content");
            return Err(PipelineError::FixRejected { reason });
        }

        info!(
            report_id,
            fixes = violations.len(),
            provider = %completion.result.provider,
            model = %completion.result.model_used,
            "fixes applied"
        );
        Ok(fixed)
    }
}

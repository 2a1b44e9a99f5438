//! Strict parsing of model output into the pipeline's structured types.
//!
//! Missing or mistyped fields are a parse failure, never a partial object.
//! Models frequently wrap JSON in a markdown code fence; the fence is
//! tolerated and stripped before deserialization.

use radscribe_util::error::ParseError;
use radscribe_util::types::{ReportOutput, StructureValidationResult};

/// Strip a surrounding markdown code fence, if present
#[must_use]
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Language tag on the opening fence ("```json")
    let rest = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest,
    };
    let body = rest.trim_end().strip_suffix("```").unwrap_or(rest);
    body.trim()
}

/// Parse a generation completion into a [`ReportOutput`].
///
/// # Errors
///
/// Returns `ParseError::InvalidJson` when the payload does not match the
/// schema and `ParseError::MissingPayload` when the report body is empty.
pub fn parse_report_output(raw: &str) -> Result<ReportOutput, ParseError> {
    let output: ReportOutput = serde_json::from_str(strip_code_fences(raw))
        .map_err(|e| ParseError::invalid_json(&e, raw))?;
    if output.report_content.trim().is_empty() {
        return Err(ParseError::MissingPayload(
            "report_content is empty".to_string(),
        ));
    }
    Ok(output)
}

/// Parse a validation completion into a [`StructureValidationResult`].
///
/// The payload carries only the violation list; validity is derived from it.
///
/// # Errors
///
/// Returns `ParseError::InvalidJson` when the payload does not match the
/// schema.
pub fn parse_validation_result(raw: &str) -> Result<StructureValidationResult, ParseError> {
    serde_json::from_str(strip_code_fences(raw)).map_err(|e| ParseError::invalid_json(&e, raw))
}

/// Parse a fix completion: plain report text, fence-stripped.
///
/// Emptiness is judged by the fix stage's sanity gate, not here, so a blank
/// completion is not a parse failure and never triggers candidate fallback.
///
/// # Errors
///
/// Infallible today; the `Result` keeps the signature uniform with the
/// other parsers so the orchestrator can treat all three identically.
pub fn parse_fix_output(raw: &str) -> Result<String, ParseError> {
    Ok(strip_code_fences(raw).to_string())
}

//! Prompt assembly for the three pipeline tasks.
//!
//! The structure rule set is fixed and non-configurable; it is rendered into
//! the validation prompt from the const table below so the rules cannot
//! drift between the prompt and the documentation.

use radscribe_util::types::StructureViolation;

/// Placeholder token for the user's signature in rendered prompts.
///
/// The signature is never requested from the model; it is stripped here and
/// appended programmatically after generation so the stored signature text
/// is reproduced exactly.
pub const SIGNATURE_PLACEHOLDER: &str = "{{signature}}";

/// The fixed structure rule set checked by the validator model
pub const STRUCTURE_RULES: [&str; 7] = [
    "No redundant restatement: a fact stated once must not be restated in different words.",
    "No duplicated anatomical mentions: each anatomical structure is addressed in exactly one place.",
    "Information density: every sentence must add information not already present.",
    "The impression section contains at most 2 bullet points.",
    "Paragraph ordering is pathology-centric: abnormal findings come before normal findings.",
    "Prose flows as complete sentences, not telegraphic fragments.",
    "Paragraphs describing normal anatomy are brief, at most one sentence per region.",
];

/// Remove every occurrence of the signature placeholder from a prompt
#[must_use]
pub fn strip_signature_placeholder(prompt: &str) -> String {
    if !prompt.contains(SIGNATURE_PLACEHOLDER) {
        return prompt.to_string();
    }
    prompt.replace(SIGNATURE_PLACEHOLDER, "")
}

/// Output contract appended to the rendered generation system prompt
const GENERATION_OUTPUT_CONTRACT: &str = r#"Respond with a single JSON object and nothing else:
{
  "report_content": "the full report text with section headings",
  "description": "one-line summary of the report, 5 to 15 words",
  "scan_type": "the scan type if determinable, otherwise omit this key"
}
Do not include the radiologist's signature; it is appended separately."#;

/// Generation system prompt: the rendered template prompt (placeholder
/// already stripped) plus the JSON output contract.
#[must_use]
pub fn generation_system_prompt(rendered_system: &str) -> String {
    format!(
        "{}\n\n{}",
        rendered_system.trim_end(),
        GENERATION_OUTPUT_CONTRACT
    )
}

/// System prompt for the validation task
#[must_use]
pub fn validation_system_prompt() -> String {
    let mut prompt = String::from(
        "You are a radiology report structure reviewer. Check the report \
         against each of the following rules:\n",
    );
    for (index, rule) in STRUCTURE_RULES.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", index + 1, rule));
    }
    prompt.push_str(
        "\nRespond with a single JSON object and nothing else:\n\
         {\"violations\": [{\"location\": \"section name or quoted sentence\", \
         \"issue\": \"what is wrong\", \
         \"fix\": \"exact instruction for correcting it\"}]}\n\
         If the report satisfies every rule, respond with {\"violations\": []}. \
         Never report a violation for a rule the report satisfies.",
    );
    prompt
}

/// User prompt for the validation task
#[must_use]
pub fn validation_user_prompt(
    report_content: &str,
    scan_type: Option<&str>,
    findings: Option<&str>,
) -> String {
    let mut prompt = String::new();
    if let Some(scan_type) = scan_type {
        prompt.push_str(&format!("Scan type: {scan_type}\n"));
    }
    if let Some(findings) = findings {
        prompt.push_str(&format!("Reported findings: {findings}\n"));
    }
    prompt.push_str(&format!("\nReport to review:\n\n{report_content}"));
    prompt
}

/// System prompt for the fix task
#[must_use]
pub fn fix_system_prompt() -> String {
    "You are a radiology report editor. Apply every listed fix exactly as \
     specified. Preserve grammatical completeness and the report's overall \
     section structure. Make no edits beyond the listed fixes. Respond with \
     the full corrected report text and nothing else."
        .to_string()
}

/// User prompt for the fix task: the report plus the prescribed fixes
#[must_use]
pub fn fix_user_prompt(report_content: &str, violations: &[StructureViolation]) -> String {
    let mut prompt = String::from("Fixes to apply:\n");
    for (index, violation) in violations.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. At {}: {} Fix: {}\n",
            index + 1,
            violation.location,
            violation.issue,
            violation.fix
        ));
    }
    prompt.push_str(&format!("\nReport:\n\n{report_content}"));
    prompt
}

//! Core domain types for the report pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Description bounds checked after generation (advisory, never fatal)
pub const DESCRIPTION_MIN_WORDS: usize = 5;
/// Upper word bound for the courtesy description
pub const DESCRIPTION_MAX_WORDS: usize = 15;
/// Upper character bound for the courtesy description
pub const DESCRIPTION_MAX_CHARS: usize = 150;

/// Pipeline task kind, mapped to a candidate chain in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Produce a report draft from a rendered template prompt
    Generate,
    /// Inspect a report against the fixed structure rule set
    Validate,
    /// Rewrite a report per a list of prescribed fixes
    Fix,
}

impl TaskKind {
    /// Stable string form used in config keys and log fields
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Generate => "generate",
            TaskKind::Validate => "validate",
            TaskKind::Fix => "fix",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One (provider, model) entry in a candidate chain.
///
/// Chains are static configuration: they are parsed once, validated, and
/// injected into the orchestrator. Nothing mutates them at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCandidate {
    /// Provider key, e.g. "anthropic" or "openrouter"
    pub provider: String,
    /// Model identifier in the provider's namespace
    pub model: String,
    /// Sampling temperature for this candidate
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Completion token budget for this candidate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Optional provider-specific reasoning-effort hint ("low"/"medium"/"high")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<String>,
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    2048
}

impl ModelCandidate {
    /// Create a candidate with default sampling parameters
    #[must_use]
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            reasoning_effort: None,
        }
    }

    /// Set the sampling temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Structured output of a successful generation run.
///
/// Deserialized strictly from the model's JSON payload; any missing or
/// mistyped field is a parse failure, never a partial object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportOutput {
    /// Full report body (markdown-ish prose with section headings)
    pub report_content: String,
    /// Courtesy one-line summary, expected 5-15 words and <=150 chars
    pub description: String,
    /// Scan type inferred by the model, when determinable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_type: Option<String>,
}

impl ReportOutput {
    /// Check the description against the advisory bounds.
    ///
    /// Out-of-bounds descriptions are accepted; the returned message is
    /// surfaced as a warning on the generation result.
    #[must_use]
    pub fn description_bounds_warning(&self) -> Option<String> {
        let words = self.description.split_whitespace().count();
        let chars = self.description.chars().count();

        if words < DESCRIPTION_MIN_WORDS || words > DESCRIPTION_MAX_WORDS {
            return Some(format!(
                "description has {} words, expected {}-{}",
                words, DESCRIPTION_MIN_WORDS, DESCRIPTION_MAX_WORDS
            ));
        }
        if chars > DESCRIPTION_MAX_CHARS {
            return Some(format!(
                "description has {} characters, expected at most {}",
                chars, DESCRIPTION_MAX_CHARS
            ));
        }
        None
    }
}

/// A located defect in report prose plus its prescribed fix text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureViolation {
    /// Where the defect occurs (section name or quoted sentence)
    pub location: String,
    /// What is wrong
    pub issue: String,
    /// Exact instruction the fix-applier must follow
    pub fix: String,
}

/// Outcome of the validation stage.
///
/// Validity is derived from the violation list rather than stored, so the
/// inconsistent state `is_valid == true` with non-empty violations cannot
/// be represented.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StructureValidationResult {
    /// Ordered list of violations found by the validator model
    pub violations: Vec<StructureViolation>,
}

impl StructureValidationResult {
    /// True when the validator found no violations
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Lifecycle state of the validate-then-fix cycle for one report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationState {
    /// Cycle scheduled, not yet finished
    Pending,
    /// Validator found no violations
    Valid,
    /// Violations were found and the fix stage completed successfully
    Fixed,
    /// A stage failed; the last good content remains servable
    Error,
}

impl ValidationState {
    /// Terminal states admit no further transition
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ValidationState::Pending)
    }
}

impl std::fmt::Display for ValidationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ValidationState::Pending => "pending",
            ValidationState::Valid => "valid",
            ValidationState::Fixed => "fixed",
            ValidationState::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// Persisted progress record for one report's validation cycle.
///
/// Created `pending` when the cycle is scheduled; transitions exactly once
/// to a terminal state and never regresses. A new generation cycle replaces
/// the record with a fresh pending one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationStatus {
    /// Current lifecycle state
    pub state: ValidationState,
    /// Violations found by the pre-fix validation run
    pub violations_count: u32,
    /// When the cycle was scheduled
    pub started_at: DateTime<Utc>,
    /// When the cycle reached a terminal state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Failure description when `state == error`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationStatus {
    /// Fresh pending record
    #[must_use]
    pub fn pending() -> Self {
        Self {
            state: ValidationState::Pending,
            violations_count: 0,
            started_at: Utc::now(),
            completed_at: None,
            error: None,
        }
    }
}

/// How a report version was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionTag {
    /// First accepted content for a generation cycle
    Initial,
    /// Output of a completed fix run
    Fixed,
    /// User-edited content recorded by a collaborator
    Manual,
}

impl std::fmt::Display for VersionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VersionTag::Initial => "initial",
            VersionTag::Fixed => "fixed",
            VersionTag::Manual => "manual",
        };
        write!(f, "{s}")
    }
}

/// Immutable snapshot of report content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Monotonic version number within one report id, starting at 1
    pub number: u64,
    /// Report content at this version
    pub content: String,
    /// How this version was produced
    pub tag: VersionTag,
    /// When this version was appended
    pub created_at: DateTime<Utc>,
    /// Version number this one was derived from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predecessor: Option<u64>,
}

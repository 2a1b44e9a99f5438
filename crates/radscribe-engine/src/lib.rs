//! Report pipeline engine: fallback orchestration and the three stages.
//!
//! The engine takes a rendered prompt pair and drives it through generation,
//! structure validation, and conditional fixing, each stage backed by its
//! own candidate chain of models. The orchestrator owns fallback between
//! candidates; retry within a candidate lives in the gateway. The pipeline
//! driver ties the stages to the status and version stores and offers sync
//! and backgrounded execution of the validate+fix portion.

mod fixup;
mod generate;
mod orchestrator;
mod parse;
mod pipeline;
mod prompts;
mod validate;

pub use fixup::FixStage;
pub use generate::{GeneratedDraft, GenerationRequest, GenerationStage};
pub use orchestrator::{
    BackendFactory, Completion, ConfigBackendFactory, FallbackRunner, ProviderMapFactory,
};
pub use parse::{parse_report_output, parse_validation_result, strip_code_fences};
pub use pipeline::{PipelineOutcome, ReportPipeline};
pub use prompts::{SIGNATURE_PLACEHOLDER, STRUCTURE_RULES};
pub use validate::{VALIDATION_TEMPERATURE, ValidationStage};

pub use radscribe_util::error::{ChainExhausted, PipelineError};

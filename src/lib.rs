//! radscribe - multi-model generation, validation, and fix pipeline for
//! structured medical reports
//!
//! radscribe drives a report through three model-backed stages: generation
//! from a rendered template prompt, structure validation against a fixed
//! rule set, and automated fixing of any violations found. Each stage runs
//! against its own configurable chain of (provider, model) candidates with
//! retry-with-backoff inside a candidate and fallback between candidates.
//! Pipeline progress is persisted as a `pending -> valid | fixed | error`
//! state machine so an asynchronous caller can poll, and every accepted
//! report mutation is recorded as an immutable tagged version.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use radscribe::engine::{GenerationRequest, ReportPipeline};
//! use radscribe::store::MemoryStore;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = radscribe::config::discover()?;
//! let store = Arc::new(MemoryStore::new());
//! let pipeline = ReportPipeline::from_config(&config, store.clone(), store);
//!
//! let outcome = pipeline
//!     .generate_report(GenerationRequest {
//!         report_id: "report-42".to_string(),
//!         system_prompt: "You are a radiologist...".to_string(),
//!         user_prompt: "FINDINGS: 4cm RUL mass".to_string(),
//!         signature: "Dr. A. Example, MD".to_string(),
//!         findings: Some("4cm RUL mass".to_string()),
//!     })
//!     .await?;
//!
//! println!("{}: {}", outcome.report_id, outcome.status.state);
//! # Ok(())
//! # }
//! ```
//!
//! # Crate layout
//!
//! - [`types`] and [`error`] - shared data model and error taxonomy
//! - [`config`] - TOML configuration: provider settings, candidate chains,
//!   retry policy, execution mode
//! - [`llm`] - model gateway: provider backends behind one trait, with
//!   per-candidate retry and timeout
//! - [`store`] - validation status and report version persistence
//!   (filesystem and in-memory)
//! - [`engine`] - fallback orchestrator, the three stages, and the
//!   pipeline driver

pub use radscribe_util::{error, types};

pub mod config {
    //! Re-export of the configuration crate
    pub use radscribe_config::*;
}

pub mod llm {
    //! Re-export of the model gateway crate
    pub use radscribe_llm::*;
}

pub mod store {
    //! Re-export of the persistence crate
    pub use radscribe_store::*;
}

pub mod engine {
    //! Re-export of the pipeline engine crate
    pub use radscribe_engine::*;
}

pub use radscribe_util::logging::init_tracing;

//! Pipeline driver: generation, then validate-and-fix, sync or backgrounded.
//!
//! Generation is always awaited and its failure is fatal. The validate+fix
//! cycle runs either inline (caller awaits the terminal status) or as a
//! detached task that owns its own store handles. Validation and fix
//! failures never surface as errors to the caller: they land on the status
//! record while the last good content stays servable.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{error, info};

use radscribe_config::{Config, ExecutionMode, PipelineConfig};
use radscribe_store::{StatusStore, VersionStore};
use radscribe_util::error::{PipelineError, StoreError};
use radscribe_util::types::{ValidationState, ValidationStatus, VersionTag};

use crate::fixup::FixStage;
use crate::generate::{GenerationRequest, GenerationStage};
use crate::orchestrator::{BackendFactory, ConfigBackendFactory, FallbackRunner};
use crate::validate::ValidationStage;

/// Final answer of one `generate_report` call
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Report id the outcome belongs to
    pub report_id: String,
    /// Current content: the fixed text in sync mode when a fix landed,
    /// otherwise the generated draft
    pub content: String,
    /// Courtesy one-line summary from generation
    pub description: String,
    /// Status at return time: terminal in sync mode, pending in async mode
    pub status: ValidationStatus,
    /// Advisory warnings from generation
    pub warnings: Vec<String>,
}

/// The validate-and-fix portion, packaged as a self-contained unit of work.
///
/// Holds its own Arc handles so the async path can outlive the request that
/// spawned it.
struct ValidationCycle {
    validation: ValidationStage,
    fixup: FixStage,
    status: Arc<dyn StatusStore>,
    versions: Arc<dyn VersionStore>,
}

/// Input snapshot for one cycle run
struct CycleInput {
    report_id: String,
    content: String,
    scan_type: Option<String>,
    findings: Option<String>,
    draft_version: u64,
}

impl ValidationCycle {
    /// Run validate, then fix when violations exist, and write exactly one
    /// terminal status transition.
    ///
    /// Returns the final content (fixed text when a fix landed, the
    /// original otherwise) alongside the terminal status.
    async fn run(&self, input: CycleInput) -> Result<(String, ValidationStatus), StoreError> {
        let report_id = input.report_id.as_str();

        let result = match self
            .validation
            .run(
                report_id,
                &input.content,
                input.scan_type.as_deref(),
                input.findings.as_deref(),
            )
            .await
        {
            Ok(result) => result,
            Err(err) => {
                let status = self.status.complete(
                    report_id,
                    ValidationState::Error,
                    0,
                    Some(err.to_string()),
                )?;
                return Ok((input.content, status));
            }
        };

        if result.is_valid() {
            let status = self
                .status
                .complete(report_id, ValidationState::Valid, 0, None)?;
            info!(report_id, "report valid, no fixes needed");
            return Ok((input.content, status));
        }

        let violations_count = result.violations.len() as u32;
        match self
            .fixup
            .run(report_id, &input.content, &result.violations)
            .await
        {
            Ok(fixed) => {
                self.versions.append(
                    report_id,
                    &fixed,
                    VersionTag::Fixed,
                    Some(input.draft_version),
                )?;
                let status = self.status.complete(
                    report_id,
                    ValidationState::Fixed,
                    violations_count,
                    None,
                )?;
                Ok((fixed, status))
            }
            Err(err) => {
                let status = self.status.complete(
                    report_id,
                    ValidationState::Error,
                    violations_count,
                    Some(err.to_string()),
                )?;
                Ok((input.content, status))
            }
        }
    }
}

/// Drives a report through generation, validation, and fixing
pub struct ReportPipeline {
    runner: Arc<FallbackRunner>,
    status: Arc<dyn StatusStore>,
    versions: Arc<dyn VersionStore>,
    settings: PipelineConfig,
}

impl ReportPipeline {
    #[must_use]
    pub fn new(
        runner: Arc<FallbackRunner>,
        status: Arc<dyn StatusStore>,
        versions: Arc<dyn VersionStore>,
        settings: PipelineConfig,
    ) -> Self {
        Self {
            runner,
            status,
            versions,
            settings,
        }
    }

    /// Build a production pipeline from configuration
    #[must_use]
    pub fn from_config(
        config: &Config,
        status: Arc<dyn StatusStore>,
        versions: Arc<dyn VersionStore>,
    ) -> Self {
        let factory: Arc<dyn BackendFactory> =
            Arc::new(ConfigBackendFactory::new(config.clone()));
        let runner = Arc::new(FallbackRunner::from_config(config, factory));
        Self::new(runner, status, versions, config.pipeline.clone())
    }

    /// Generate a report, persist the draft, and run the validate+fix cycle
    /// per the configured execution mode.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Generation` when every generate candidate
    /// fails (nothing is persisted) and `PipelineError::Store` on
    /// persistence failures. Validation and fix failures are not errors
    /// here; they are reflected on the returned status.
    pub async fn generate_report(
        &self,
        request: GenerationRequest,
    ) -> Result<PipelineOutcome, PipelineError> {
        let stage = GenerationStage::new(self.runner.clone());
        let draft = stage
            .run(&request)
            .await
            .map_err(PipelineError::Generation)?;

        let report_id = request.report_id.clone();
        let version = self
            .versions
            .append(&report_id, &draft.content, VersionTag::Initial, None)?;
        let pending = self.status.create_pending(&report_id)?;

        let cycle = ValidationCycle {
            validation: ValidationStage::new(self.runner.clone()),
            fixup: FixStage::new(self.runner.clone()),
            status: self.status.clone(),
            versions: self.versions.clone(),
        };
        let input = CycleInput {
            report_id: report_id.clone(),
            content: draft.content.clone(),
            scan_type: draft.scan_type.clone(),
            findings: request.findings.clone(),
            draft_version: version.number,
        };

        match self.settings.mode {
            ExecutionMode::Sync => {
                let (content, status) = cycle.run(input).await?;
                Ok(PipelineOutcome {
                    report_id,
                    content,
                    description: draft.description,
                    status,
                    warnings: draft.warnings,
                })
            }
            ExecutionMode::Async => {
                self.spawn_cycle(cycle, input);
                Ok(PipelineOutcome {
                    report_id,
                    content: draft.content,
                    description: draft.description,
                    status: pending,
                    warnings: draft.warnings,
                })
            }
        }
    }

    // The detached task owns every handle it needs; nothing is borrowed
    // from the originating request. No caller-initiated cancellation.
    fn spawn_cycle(&self, cycle: ValidationCycle, input: CycleInput) {
        let report_id = input.report_id.clone();
        tokio::spawn(async move {
            if let Err(err) = cycle.run(input).await {
                error!(report_id = %report_id, error = %err, "background validation cycle failed to persist");
            }
        });
    }

    /// Current validation status for a report
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on invalid ids or persistence failures.
    pub fn get_validation_status(
        &self,
        report_id: &str,
    ) -> Result<Option<ValidationStatus>, StoreError> {
        self.status.get(report_id)
    }

    /// Poll until the report's status is terminal or the bounded wait
    /// elapses.
    ///
    /// Returns `None` when the status is still pending at the deadline; the
    /// background work keeps running and its result stays retrievable.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on invalid ids or persistence failures.
    pub async fn await_terminal(
        &self,
        report_id: &str,
        max_wait: Option<Duration>,
    ) -> Result<Option<ValidationStatus>, StoreError> {
        let deadline = Instant::now()
            + max_wait.unwrap_or(Duration::from_secs(self.settings.poll_timeout_secs));
        let interval = Duration::from_millis(self.settings.poll_interval_ms);

        loop {
            if let Some(status) = self.status.get(report_id)?
                && status.state.is_terminal()
            {
                return Ok(Some(status));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            sleep(interval).await;
        }
    }
}

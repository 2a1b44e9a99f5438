//! Constraint checks over a parsed configuration.

use radscribe_util::types::{ModelCandidate, TaskKind};

use crate::{Config, ConfigError};

impl Config {
    /// Validate pipeline constraints.
    ///
    /// Checked here rather than at use sites so misconfiguration is a load
    /// error instead of a mid-pipeline surprise:
    /// - generate and validate chains must be non-empty;
    /// - the fix chain must hold exactly one candidate (single fix-applier);
    /// - every candidate carries a provider, a model, a temperature in
    ///   [0.0, 2.0], and a non-zero token budget;
    /// - retry attempts must be at least 1.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tasks.generate.is_empty() {
            return Err(ConfigError::Invalid(
                "tasks.generate must list at least one candidate".to_string(),
            ));
        }
        if self.tasks.validate.is_empty() {
            return Err(ConfigError::Invalid(
                "tasks.validate must list at least one candidate".to_string(),
            ));
        }
        if self.tasks.fix.len() != 1 {
            return Err(ConfigError::Invalid(format!(
                "tasks.fix must list exactly one candidate (the fix-applier), got {}",
                self.tasks.fix.len()
            )));
        }

        for task in [TaskKind::Generate, TaskKind::Validate, TaskKind::Fix] {
            for candidate in self.tasks.chain(task) {
                validate_candidate(task, candidate)?;
            }
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn validate_candidate(task: TaskKind, candidate: &ModelCandidate) -> Result<(), ConfigError> {
    if candidate.provider.trim().is_empty() {
        return Err(ConfigError::Invalid(format!(
            "tasks.{task}: candidate has an empty provider"
        )));
    }
    if candidate.model.trim().is_empty() {
        return Err(ConfigError::Invalid(format!(
            "tasks.{task}: candidate for provider '{}' has an empty model",
            candidate.provider
        )));
    }
    if !(0.0..=2.0).contains(&candidate.temperature) {
        return Err(ConfigError::Invalid(format!(
            "tasks.{task}: temperature {} for {}/{} is out of range [0.0, 2.0]",
            candidate.temperature, candidate.provider, candidate.model
        )));
    }
    if candidate.max_tokens == 0 {
        return Err(ConfigError::Invalid(format!(
            "tasks.{task}: max_tokens must be non-zero for {}/{}",
            candidate.provider, candidate.model
        )));
    }
    Ok(())
}

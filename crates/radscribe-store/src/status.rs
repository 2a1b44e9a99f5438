//! Validation status store: the persisted state machine.

use chrono::Utc;

use radscribe_util::error::StoreError;
use radscribe_util::types::{ValidationState, ValidationStatus};

/// Store for per-report validation status records.
///
/// Lifecycle contract: `create_pending` installs a fresh `pending` record
/// (replacing any previous record; a new generation cycle starts a new
/// status), and `complete` performs the single pending -> terminal
/// transition. Terminal records never change again.
///
/// At-most-one-active-validation per report id is NOT enforced here; two
/// racing cycles for the same id each see the usual transition checks
/// against the current record, and the last terminal write wins.
pub trait StatusStore: Send + Sync {
    /// Install a fresh pending record for the report.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on invalid ids or persistence failures.
    fn create_pending(&self, report_id: &str) -> Result<ValidationStatus, StoreError>;

    /// Transition the report's record to a terminal state.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no record exists and `InvalidTransition`
    /// when the record is already terminal or `state` is not terminal.
    fn complete(
        &self,
        report_id: &str,
        state: ValidationState,
        violations_count: u32,
        error: Option<String>,
    ) -> Result<ValidationStatus, StoreError>;

    /// Current status record, if any.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on invalid ids or persistence failures.
    fn get(&self, report_id: &str) -> Result<Option<ValidationStatus>, StoreError>;
}

/// Apply the single pending -> terminal transition to a status record.
///
/// Shared by every store implementation so the lifecycle rules live in one
/// place.
///
/// # Errors
///
/// Returns `InvalidTransition` when `state` is not terminal or the record
/// already is.
pub fn apply_terminal(
    report_id: &str,
    status: &mut ValidationStatus,
    state: ValidationState,
    violations_count: u32,
    error: Option<String>,
) -> Result<(), StoreError> {
    if !state.is_terminal() || status.state.is_terminal() {
        return Err(StoreError::InvalidTransition {
            report_id: report_id.to_string(),
            from: status.state.to_string(),
            to: state.to_string(),
        });
    }

    status.state = state;
    status.violations_count = violations_count;
    status.completed_at = Some(Utc::now());
    status.error = error;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_transitions_once() {
        let mut status = ValidationStatus::pending();
        apply_terminal("rep-1", &mut status, ValidationState::Fixed, 2, None).unwrap();
        assert_eq!(status.state, ValidationState::Fixed);
        assert_eq!(status.violations_count, 2);
        assert!(status.completed_at.is_some());

        let err = apply_terminal("rep-1", &mut status, ValidationState::Valid, 0, None)
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
    }

    #[test]
    fn cannot_transition_to_pending() {
        let mut status = ValidationStatus::pending();
        let err = apply_terminal("rep-1", &mut status, ValidationState::Pending, 0, None)
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
        assert_eq!(status.state, ValidationState::Pending);
    }

    #[test]
    fn error_transition_records_reason() {
        let mut status = ValidationStatus::pending();
        apply_terminal(
            "rep-1",
            &mut status,
            ValidationState::Error,
            3,
            Some("all candidates failed".to_string()),
        )
        .unwrap();
        assert_eq!(status.error.as_deref(), Some("all candidates failed"));
        assert_eq!(status.violations_count, 3);
    }
}

//! In-memory store for tests and embedding hosts.

use std::collections::HashMap;
use std::sync::Mutex;

use radscribe_util::error::StoreError;
use radscribe_util::types::{ReportVersion, ValidationState, ValidationStatus, VersionTag};

use crate::check_report_id;
use crate::status::{StatusStore, apply_terminal};
use crate::version::{VersionStore, next_version};

/// Mutex-guarded map implementation of both store traits
#[derive(Default)]
pub struct MemoryStore {
    statuses: Mutex<HashMap<String, ValidationStatus>>,
    versions: Mutex<HashMap<String, Vec<ReportVersion>>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatusStore for MemoryStore {
    fn create_pending(&self, report_id: &str) -> Result<ValidationStatus, StoreError> {
        check_report_id(report_id)?;
        let status = ValidationStatus::pending();
        self.statuses
            .lock()
            .unwrap()
            .insert(report_id.to_string(), status.clone());
        Ok(status)
    }

    fn complete(
        &self,
        report_id: &str,
        state: ValidationState,
        violations_count: u32,
        error: Option<String>,
    ) -> Result<ValidationStatus, StoreError> {
        check_report_id(report_id)?;
        let mut statuses = self.statuses.lock().unwrap();
        let status = statuses
            .get_mut(report_id)
            .ok_or_else(|| StoreError::NotFound {
                report_id: report_id.to_string(),
            })?;
        apply_terminal(report_id, status, state, violations_count, error)?;
        Ok(status.clone())
    }

    fn get(&self, report_id: &str) -> Result<Option<ValidationStatus>, StoreError> {
        check_report_id(report_id)?;
        Ok(self.statuses.lock().unwrap().get(report_id).cloned())
    }
}

impl VersionStore for MemoryStore {
    fn append(
        &self,
        report_id: &str,
        content: &str,
        tag: VersionTag,
        predecessor: Option<u64>,
    ) -> Result<ReportVersion, StoreError> {
        check_report_id(report_id)?;
        let mut versions = self.versions.lock().unwrap();
        let history = versions.entry(report_id.to_string()).or_default();
        let version = next_version(history, content, tag, predecessor);
        history.push(version.clone());
        Ok(version)
    }

    fn list(&self, report_id: &str) -> Result<Vec<ReportVersion>, StoreError> {
        check_report_id(report_id)?;
        Ok(self
            .versions
            .lock()
            .unwrap()
            .get(report_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_requires_existing_record() {
        let store = MemoryStore::new();
        let err = store
            .complete("rep-1", ValidationState::Valid, 0, None)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn fresh_cycle_replaces_terminal_record() {
        let store = MemoryStore::new();
        store.create_pending("rep-1").unwrap();
        store
            .complete("rep-1", ValidationState::Valid, 0, None)
            .unwrap();

        // New generation cycle starts a fresh pending record
        let status = store.create_pending("rep-1").unwrap();
        assert_eq!(status.state, ValidationState::Pending);
        store
            .complete("rep-1", ValidationState::Error, 1, Some("boom".into()))
            .unwrap();
        assert_eq!(
            store.get("rep-1").unwrap().unwrap().state,
            ValidationState::Error
        );
    }

    #[test]
    fn versions_number_monotonically_with_predecessors() {
        let store = MemoryStore::new();
        let v1 = store
            .append("rep-1", "draft", VersionTag::Initial, None)
            .unwrap();
        let v2 = store
            .append("rep-1", "fixed", VersionTag::Fixed, Some(v1.number))
            .unwrap();

        assert_eq!(v1.number, 1);
        assert_eq!(v2.number, 2);
        assert_eq!(v2.predecessor, Some(1));
        assert_eq!(store.latest("rep-1").unwrap().unwrap().content, "fixed");
        assert_eq!(store.list("rep-1").unwrap().len(), 2);
    }

    #[test]
    fn reports_are_isolated() {
        let store = MemoryStore::new();
        store.append("rep-a", "a", VersionTag::Initial, None).unwrap();
        store.create_pending("rep-a").unwrap();

        assert!(store.list("rep-b").unwrap().is_empty());
        assert!(store.get("rep-b").unwrap().is_none());
    }
}

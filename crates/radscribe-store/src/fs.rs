//! Filesystem store: one directory per report id, JSON records written
//! atomically.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use radscribe_util::atomic_write::write_file_atomic;
use radscribe_util::error::StoreError;
use radscribe_util::types::{ReportVersion, ValidationState, ValidationStatus, VersionTag};

use crate::check_report_id;
use crate::status::{StatusStore, apply_terminal};
use crate::version::{VersionStore, next_version};

const STATUS_FILE: &str = "status.json";
const VERSIONS_FILE: &str = "versions.json";

/// JSON-on-disk implementation of both store traits.
///
/// Every operation opens what it needs and releases it on return; a handle
/// can therefore be cloned into a detached task without tying it to the
/// originating request's lifetime.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Create a store rooted at `root` (created lazily on first write)
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn report_dir(&self, report_id: &str) -> PathBuf {
        self.root.join(report_id)
    }

    fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(value)?;
        write_file_atomic(path, &raw)?;
        Ok(())
    }
}

impl StatusStore for FsStore {
    fn create_pending(&self, report_id: &str) -> Result<ValidationStatus, StoreError> {
        check_report_id(report_id)?;
        let status = ValidationStatus::pending();
        let path = self.report_dir(report_id).join(STATUS_FILE);
        Self::write_json(&path, &status)?;
        debug!(report_id, "created pending validation status");
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
        let path = self.report_dir(report_id).join(STATUS_FILE);
        let mut status: ValidationStatus =
            Self::read_json(&path)?.ok_or_else(|| StoreError::NotFound {
                report_id: report_id.to_string(),
            })?;
        apply_terminal(report_id, &mut status, state, violations_count, error)?;
        Self::write_json(&path, &status)?;
        debug!(report_id, state = %status.state, "validation status finalized");
        Ok(status)
    }

    fn get(&self, report_id: &str) -> Result<Option<ValidationStatus>, StoreError> {
        check_report_id(report_id)?;
        Self::read_json(&self.report_dir(report_id).join(STATUS_FILE))
    }
}

impl VersionStore for FsStore {
    fn append(
        &self,
        report_id: &str,
        content: &str,
        tag: VersionTag,
        predecessor: Option<u64>,
    ) -> Result<ReportVersion, StoreError> {
        check_report_id(report_id)?;
        let path = self.report_dir(report_id).join(VERSIONS_FILE);
        let mut history: Vec<ReportVersion> = Self::read_json(&path)?.unwrap_or_default();
        let version = next_version(&history, content, tag, predecessor);
        history.push(version.clone());
        Self::write_json(&path, &history)?;
        debug!(report_id, number = version.number, tag = %version.tag, "report version appended");
        Ok(version)
    }

    fn list(&self, report_id: &str) -> Result<Vec<ReportVersion>, StoreError> {
        check_report_id(report_id)?;
        Ok(Self::read_json(&self.report_dir(report_id).join(VERSIONS_FILE))?.unwrap_or_default())
    }
}

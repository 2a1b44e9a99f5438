//! Append-only report version store.

use radscribe_util::error::StoreError;
use radscribe_util::types::{ReportVersion, VersionTag};

/// Store for immutable report content snapshots.
///
/// Versions are append-only and numbered monotonically from 1 within one
/// report id; a version is never mutated after `append` returns.
pub trait VersionStore: Send + Sync {
    /// Append a new version and return it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on invalid ids or persistence failures.
    fn append(
        &self,
        report_id: &str,
        content: &str,
        tag: VersionTag,
        predecessor: Option<u64>,
    ) -> Result<ReportVersion, StoreError>;

    /// All versions for a report, in append order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on invalid ids or persistence failures.
    fn list(&self, report_id: &str) -> Result<Vec<ReportVersion>, StoreError>;

    /// Most recently appended version, if any.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on invalid ids or persistence failures.
    fn latest(&self, report_id: &str) -> Result<Option<ReportVersion>, StoreError> {
        Ok(self.list(report_id)?.into_iter().last())
    }
}

/// Build the next version record for an existing history.
pub(crate) fn next_version(
    history: &[ReportVersion],
    content: &str,
    tag: VersionTag,
    predecessor: Option<u64>,
) -> ReportVersion {
    let number = history.last().map_or(1, |v| v.number + 1);
    ReportVersion {
        number,
        content: content.to_string(),
        tag,
        created_at: chrono::Utc::now(),
        predecessor,
    }
}

//! Persistence for the validation state machine and the version store.
//!
//! Both stores are trait seams: the pipeline only sees [`StatusStore`] and
//! [`VersionStore`], shared as `Arc<dyn ...>` handles. A detached validation
//! task clones its own handles rather than borrowing anything scoped to the
//! originating request. [`FsStore`] persists JSON records atomically on
//! disk; [`MemoryStore`] backs tests and embedding hosts.

mod fs;
mod memory;
mod status;
mod version;

pub use fs::FsStore;
pub use memory::MemoryStore;
pub use status::{StatusStore, apply_terminal};
pub use version::VersionStore;

pub use radscribe_util::error::StoreError;

/// Report ids become directory names; restrict them to a filesystem-safe
/// alphabet.
pub(crate) fn check_report_id(report_id: &str) -> Result<(), StoreError> {
    let ok = !report_id.is_empty()
        && report_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidReportId(report_id.to_string()))
    }
}

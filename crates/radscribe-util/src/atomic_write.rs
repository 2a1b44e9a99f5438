//! Atomic file writes via temp file + fsync + rename.
//!
//! Store records are rewritten on every status transition; writing through a
//! temporary file in the target directory keeps readers from ever observing
//! a torn record.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Atomically replace `path` with `content`.
///
/// Writes to a temporary file in the same directory, fsyncs it, then renames
/// over the target. The parent directory is created if missing.
///
/// # Errors
///
/// Returns the underlying I/O error if the temp file cannot be created,
/// written, synced, or renamed into place.
pub fn write_file_atomic(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(content.as_bytes())?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("status.json");

        write_file_atomic(&target, "{\"state\":\"pending\"}").unwrap();
        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            "{\"state\":\"pending\"}"
        );

        write_file_atomic(&target, "{\"state\":\"valid\"}").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "{\"state\":\"valid\"}");
    }

    #[test]
    fn leaves_no_temp_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("versions.json");
        write_file_atomic(&target, "[]").unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("versions.json")]);
    }
}

//! Snapshot directory listing and per-batch ingestion results.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use promfold_core::MetricFamily;
use tracing::{debug, trace};

use crate::error::{StoreError, StoreResult, map_io};

/// Outcome of ingesting a snapshot directory.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// In-memory state after the whole directory was processed.
    pub families: Vec<MetricFamily>,
    /// Snapshots merged (and deleted, when consuming).
    pub merged: Vec<PathBuf>,
    /// Snapshots listed but gone by the time they were read.
    pub missed: Vec<PathBuf>,
    /// Entries left alone because they are not regular files.
    pub skipped: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
}

/// A snapshot that could not be ingested.
///
/// For [`StoreError::Consume`] the snapshot's values are already part of the
/// state; only its deletion failed.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: StoreError,
}

impl IngestReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Directory entries found by [`list_snapshots`].
#[derive(Debug, Default)]
pub(crate) struct Listing {
    pub snapshots: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

/// List the snapshot files in `dir`, sorted by file name.
///
/// Entries for which `is_own` returns true (given the canonical path) are
/// dropped silently. Anything that is not a regular file goes to
/// `skipped`. Entries that vanish while being inspected are left in the
/// list; reading them later reports them as missed.
pub(crate) fn list_snapshots(dir: &Path, is_own: impl Fn(&Path) -> bool) -> StoreResult<Listing> {
    let canonical_dir = fs::canonicalize(dir).map_err(map_io!(Io, dir))?;
    let entries = fs::read_dir(dir).map_err(map_io!(Io, dir))?;

    let mut listing = Listing::default();
    for entry in entries {
        let entry = entry.map_err(map_io!(Io, dir))?;
        let name = entry.file_name();
        if is_own(&canonical_dir.join(&name)) {
            trace!(?name, "skipping state store file");
            continue;
        }

        let path = entry.path();
        match fs::metadata(&path) {
            Ok(meta) if !meta.is_file() => {
                debug!(?path, "skipping non-file entry");
                listing.skipped.push(path);
                continue;
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e).map_err(map_io!(Io, &path)),
        }
        listing.snapshots.push(path);
    }

    listing.snapshots.sort();
    listing.skipped.sort();
    Ok(listing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_regular_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.json", "a.json", ".c.json"] {
            fs::write(dir.path().join(name), "[]").unwrap();
        }
        fs::create_dir(dir.path().join("sub")).unwrap();

        let listing = list_snapshots(dir.path(), |_| false).unwrap();
        assert_eq!(
            listing.snapshots,
            vec![
                dir.path().join(".c.json"),
                dir.path().join("a.json"),
                dir.path().join("b.json"),
            ]
        );
        assert_eq!(listing.skipped, vec![dir.path().join("sub")]);
    }

    #[test]
    fn own_files_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("state.json"), "[]").unwrap();
        fs::write(dir.path().join("w.json"), "[]").unwrap();

        let state = fs::canonicalize(dir.path().join("state.json")).unwrap();
        let listing = list_snapshots(dir.path(), |p| p == state).unwrap();
        assert_eq!(listing.snapshots, vec![dir.path().join("w.json")]);
        assert!(listing.skipped.is_empty());
    }

    #[test]
    fn empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let listing = list_snapshots(dir.path(), |_| false).unwrap();
        assert!(listing.snapshots.is_empty());
        assert!(listing.skipped.is_empty());
    }

    #[test]
    fn report_is_clean_without_failures() {
        let mut report = IngestReport::default();
        assert!(report.is_clean());
        report.failures.push(FileFailure {
            path: PathBuf::from("x.json"),
            error: StoreError::Consume {
                path: PathBuf::from("x.json"),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            },
        });
        assert!(!report.is_clean());
    }
}

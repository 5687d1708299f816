//! StateStore — file-backed cumulative metric state.
//!
//! The store keeps the merged family list in memory and writes it to the
//! state file only on [`StateStore::save`] / [`StateStore::persist`].
//! Ingestion replaces the in-memory list with the output of
//! [`promfold_core::merge`]; a snapshot that fails to parse leaves both the
//! in-memory state and the snapshot file untouched.
//!
//! An open store holds the state file's lock until it is dropped, so no
//! other store can merge into the same file and overwrite its results.

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use promfold_core::{MetricFamily, codec, merge};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult, map_io};
use crate::ingest::{self, FileFailure, IngestReport};
use crate::lock::{StateLock, lock_path};

/// Document written to a freshly created state file.
const EMPTY_STATE: &[u8] = b"[]";

const TEMP_SUFFIX: &str = ".tmp";

/// Cumulative metric state backed by a single JSON file.
pub struct StateStore {
    path: PathBuf,
    _lock: StateLock,
    families: Vec<MetricFamily>,
}

impl StateStore {
    /// Open the state file at `path`, creating it with an empty family list
    /// if it does not exist.
    ///
    /// Fails with [`StoreError::Lock`] while another store has the same file
    /// open.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let lock = StateLock::acquire(path)?;
        match fs::metadata(path) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                write_atomic(path, EMPTY_STATE)?;
                debug!(?path, "initialized empty state file");
            }
            Err(e) => return Err(e).map_err(map_io!(Io, path)),
        }

        let families = read_families(path)?;
        debug!(?path, families = families.len(), "state store opened");
        Ok(Self {
            path: path.to_path_buf(),
            _lock: lock,
            families,
        })
    }

    /// The current in-memory state.
    pub fn families(&self) -> &[MetricFamily] {
        &self.families
    }

    /// Path of the backing state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the state file's contents with `families`.
    ///
    /// The in-memory state is not changed. On failure the previous file
    /// contents stay in place.
    pub fn save(&mut self, families: &[MetricFamily]) -> StoreResult<()> {
        write_state(&self.path, families)
    }

    /// Write the current in-memory state to the state file.
    pub fn persist(&mut self) -> StoreResult<()> {
        write_state(&self.path, &self.families)
    }

    /// Re-read the state file, discarding the in-memory state.
    ///
    /// On failure the in-memory state is kept.
    pub fn reload(&mut self) -> StoreResult<&[MetricFamily]> {
        self.families = read_families(&self.path)?;
        debug!(path = ?self.path, families = self.families.len(), "state reloaded");
        Ok(&self.families)
    }

    /// Merge the snapshot at `path` into the in-memory state.
    ///
    /// With `consume`, the snapshot is deleted once the merge has been
    /// applied. A snapshot that fails to read or parse is left in place and
    /// the state is unchanged.
    pub fn ingest_file(&mut self, path: &Path, consume: bool) -> StoreResult<&[MetricFamily]> {
        let incoming = read_families(path)?;
        let incoming_families = incoming.len();
        let previous_families = self.families.len();

        self.families = merge(&self.families, incoming);
        debug!(
            ?path,
            incoming = incoming_families,
            previous = previous_families,
            merged = self.families.len(),
            "snapshot merged"
        );

        if consume {
            remove_consumed(path)?;
        }
        Ok(&self.families)
    }

    /// Merge every snapshot file in `dir` into the in-memory state.
    ///
    /// The directory is listed once up front. A failure on one file is
    /// recorded in the report and does not stop the remaining files; a file
    /// that disappears before it is read counts as missed. The store's own
    /// state, lock and temporary files are never ingested. Only a failure to
    /// list `dir` itself is returned as an error.
    pub fn ingest_directory(&mut self, dir: &Path, consume: bool) -> StoreResult<IngestReport> {
        let state = fs::canonicalize(&self.path).ok();
        let lock = fs::canonicalize(lock_path(&self.path)).ok();
        let state_dir = state.as_deref().and_then(Path::parent);
        let prefix = temp_prefix(&self.path);
        let is_own = |candidate: &Path| {
            Some(candidate) == state.as_deref()
                || Some(candidate) == lock.as_deref()
                || (candidate.parent() == state_dir && is_temp_name(candidate, &prefix))
        };

        let listing = ingest::list_snapshots(dir, is_own)?;
        debug!(
            ?dir,
            files = listing.snapshots.len(),
            skipped = listing.skipped.len(),
            consume,
            "ingesting snapshot directory"
        );

        let mut report = IngestReport {
            skipped: listing.skipped,
            ..IngestReport::default()
        };
        for path in listing.snapshots {
            match self.ingest_file(&path, consume) {
                Ok(_) => report.merged.push(path),
                Err(e) if e.is_not_found() => {
                    debug!(?path, "snapshot vanished before it was read");
                    report.missed.push(path);
                }
                Err(error) => {
                    warn!(?path, %error, "snapshot ingestion failed");
                    report.failures.push(FileFailure { path, error });
                }
            }
        }

        report.families = self.families.clone();
        Ok(report)
    }
}

/// Read and decode the state file at `path` without opening a store.
///
/// Unlike [`StateStore::open`] this never creates the file. Since saves
/// replace the file by rename, the document read is always complete.
pub fn load_state(path: &Path) -> StoreResult<Vec<MetricFamily>> {
    read_families(path)
}

fn read_families(path: &Path) -> StoreResult<Vec<MetricFamily>> {
    let mut bytes = Vec::new();
    File::open(path)
        .and_then(|mut file| file.read_to_end(&mut bytes))
        .map_err(map_io!(Io, path))?;
    codec::decode(&bytes).map_err(|e| StoreError::decode(path.to_path_buf(), e))
}

fn write_state(path: &Path, families: &[MetricFamily]) -> StoreResult<()> {
    let bytes = codec::encode(families)
        .map_err(io::Error::other)
        .map_err(map_io!(Persistence, path))?;
    write_atomic(path, &bytes)?;
    debug!(?path, families = families.len(), bytes = bytes.len(), "state saved");
    Ok(())
}

/// Write `bytes` to a hidden temporary sibling of `path`, sync it, and
/// rename it over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(&temp_prefix(path))
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .map_err(map_io!(Persistence, path))?;
    tmp.write_all(bytes)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(map_io!(Persistence, path))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .map_err(map_io!(Persistence, path))?;
    Ok(())
}

/// File-name prefix of the temporaries [`write_atomic`] creates for `path`.
fn temp_prefix(path: &Path) -> String {
    format!(".{}.", path.file_name().unwrap_or_default().to_string_lossy())
}

fn is_temp_name(path: &Path, prefix: &str) -> bool {
    path.file_name()
        .and_then(OsStr::to_str)
        .is_some_and(|name| name.starts_with(prefix) && name.ends_with(TEMP_SUFFIX))
}

fn remove_consumed(path: &Path) -> StoreResult<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(?path, "consumed snapshot deleted");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(?path, "consumed snapshot already gone");
            Ok(())
        }
        Err(e) => Err(e).map_err(map_io!(Consume, path)),
    }
}

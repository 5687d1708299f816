//! Advisory lock giving one store exclusive ownership of a state file.
//!
//! The lock lives on a sidecar file (`state.json` → `state.json.lock`)
//! rather than on the state file itself, because every save replaces the
//! state file by rename. It is taken when a store opens and released when
//! the store is dropped, so at most one store per state file exists at a
//! time across all processes.

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fd_lock::RwLock;
use tracing::debug;

use crate::error::{StoreResult, map_io};

/// Exclusive lock on one state file, held until dropped.
pub struct StateLock {
    path: PathBuf,
    // Closing this handle releases the lock.
    _file: RwLock<File>,
}

impl StateLock {
    /// Open (or create) the lock file belonging to `state_path` and take
    /// the exclusive side without waiting.
    ///
    /// Fails with [`StoreError::Lock`](crate::StoreError::Lock) when another
    /// store, in this process or another, holds the lock.
    pub fn acquire(state_path: &Path) -> StoreResult<Self> {
        let path = lock_path(state_path);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(map_io!(Lock, &path))?;

        let mut lock = RwLock::new(file);
        let guard = lock.try_write().map_err(map_io!(Lock, &path))?;
        // The guard borrows `lock`; forgetting it keeps the lock held for as
        // long as the handle stays open instead of tying it to this scope.
        std::mem::forget(guard);

        debug!(?path, "state lock acquired");
        Ok(Self { path, _file: lock })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Path of the lock file for `state_path`.
pub fn lock_path(state_path: &Path) -> PathBuf {
    let mut name = state_path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".lock");
    state_path.with_file_name(name)
}

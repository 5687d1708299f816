//! Error types for the promfold state store.

use std::io;
use std::path::PathBuf;

use promfold_core::CodecError;
use thiserror::Error;

/// Convert an `io::Error` into a path-carrying `StoreError` variant via a closure factory.
macro_rules! map_io {
    ($variant:ident, $path:expr) => {
        |source| $crate::error::StoreError::$variant {
            path: ::std::path::PathBuf::from($path),
            source,
        }
    };
}

pub(crate) use map_io;

/// Result type alias for state store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while loading, ingesting, or persisting state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The file is not valid JSON.
    #[error("corrupt metrics file {}: {source}", path.display())]
    StateCorrupt {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    /// The file is JSON but does not describe metric families.
    #[error("invalid metrics file {}: {source}", path.display())]
    SchemaValidation {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to persist state to {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The snapshot was merged but could not be deleted afterwards.
    #[error("merged {} but failed to delete it: {source}", path.display())]
    Consume {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to lock {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    /// Classify a decode failure for the file at `path`.
    pub(crate) fn decode(path: PathBuf, source: CodecError) -> Self {
        if source.is_schema() {
            StoreError::SchemaValidation { path, source }
        } else {
            StoreError::StateCorrupt { path, source }
        }
    }

    /// True when the file vanished before it could be read.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }

    /// The file this error refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            StoreError::StateCorrupt { path, .. }
            | StoreError::SchemaValidation { path, .. }
            | StoreError::Io { path, .. }
            | StoreError::Persistence { path, .. }
            | StoreError::Consume { path, .. }
            | StoreError::Lock { path, .. } => path,
        }
    }
}

//! promfold-store — file-backed cumulative metric state.
//!
//! A [`StateStore`] owns the in-memory family list, loads it from a single
//! JSON state file, and folds worker snapshot files into it with
//! [`promfold_core::merge`].
//!
//! # Architecture
//!
//! ```text
//! spool dir ── ingest_directory() ─┐
//! snapshot  ── ingest_file() ──────┴─> merge() ─> in-memory state
//!                                                     │
//!                                    persist() / save()
//!                                                     ▼
//!                                                state file ──> exporter
//! ```
//!
//! State-file writes go to a temporary sibling that is renamed into place,
//! so readers only ever see a whole document. An open store holds an advisory
//! lock on `<state file>.lock` until it is dropped, so only one store at a
//! time, in any process, merges into a given state file.

pub mod error;
pub mod ingest;
pub mod lock;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use ingest::{FileFailure, IngestReport};
pub use store::{StateStore, load_state};

pub use promfold_core::{FamilyKey, MetricFamily, Sample};

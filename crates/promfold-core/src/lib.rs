//! promfold-core — data model and merge logic for promfold.
//!
//! Worker processes write self-contained metric snapshots; promfold folds
//! them into one cumulative state. This crate holds the pieces that need no
//! filesystem access:
//!
//! - [`Sample`] / [`MetricFamily`]: the JSON document model shared by
//!   snapshot files and the persisted state file.
//! - [`codec`]: decoding (with schema validation) and encoding of documents.
//! - [`merge()`]: combines the prior state with an incoming batch.
//!
//! # Merge policy
//!
//! ```text
//! state ──┐
//!         ├── merge() ──> families of `incoming`, with matched sample
//! incoming┘               values added onto the prior values
//! ```
//!
//! The result always mirrors the family set of the incoming batch. Only the
//! values of samples that already existed in a matching family accumulate.

pub mod codec;
pub mod error;
pub mod merge;
pub mod types;

pub use codec::{decode, encode, encode_pretty};
pub use error::{CodecError, CodecResult};
pub use merge::merge;
pub use types::*;

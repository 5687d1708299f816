//! Error types for decoding and encoding metric documents.

use thiserror::Error;

/// Result type alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors raised while decoding or encoding a metric document.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The bytes are not valid JSON.
    #[error("malformed JSON: {0}")]
    Corrupt(#[source] serde_json::Error),

    /// Valid JSON that does not describe a list of metric families.
    #[error("schema mismatch: {0}")]
    Schema(#[source] serde_json::Error),

    #[error("sample {sample:?} in family {family:?} has {names} label names but {values} label values")]
    LabelArity {
        family: String,
        sample: String,
        names: usize,
        values: usize,
    },

    #[error("sample {sample:?} in family {family:?} repeats label name {label:?}")]
    DuplicateLabel {
        family: String,
        sample: String,
        label: String,
    },

    #[error("failed to encode metric families: {0}")]
    Encode(#[source] serde_json::Error),
}

impl CodecError {
    /// True when the document parsed as JSON but failed validation.
    pub fn is_schema(&self) -> bool {
        matches!(
            self,
            CodecError::Schema(_) | CodecError::LabelArity { .. } | CodecError::DuplicateLabel { .. }
        )
    }
}

//! Metric document model.
//!
//! Snapshot files and the state file share one schema: a JSON array of
//! families, each carrying its samples. Field names follow the wire format
//! (`labelNames`, `labelValues`), so a family read from disk serializes back
//! unchanged.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

// ── Sample ────────────────────────────────────────────────────────

/// One labeled measurement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub name: String,
    /// Label keys, positionally paired with `label_values`.
    pub label_names: Vec<String>,
    pub label_values: Vec<String>,
    /// Non-finite values are written as `"NaN"`, `"+Inf"` or `"-Inf"`.
    #[serde(with = "sample_value")]
    pub value: f64,
}

impl Sample {
    pub fn new(
        name: impl Into<String>,
        label_names: Vec<String>,
        label_values: Vec<String>,
        value: f64,
    ) -> Self {
        Self {
            name: name.into(),
            label_names,
            label_values,
            value,
        }
    }

    /// Whether `incoming` reports the same series as `self`.
    ///
    /// This is a one-directional subset test: every label value of
    /// `incoming` must appear somewhere in `self.label_values`. Positions
    /// and label names are ignored, and an incoming sample without label
    /// values matches any base sample.
    pub fn matches(&self, incoming: &Sample) -> bool {
        incoming
            .label_values
            .iter()
            .all(|value| self.label_values.contains(value))
    }

    /// The first label name that occurs twice, if any.
    pub(crate) fn duplicate_label(&self) -> Option<&str> {
        let mut seen = BTreeSet::new();
        self.label_names
            .iter()
            .find(|name| !seen.insert(name.as_str()))
            .map(String::as_str)
    }
}

// ── MetricFamily ──────────────────────────────────────────────────

/// A named group of samples sharing a type, help text, and label schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricFamily {
    pub name: String,
    /// Metric type ("counter", "gauge", "histogram", ...). Opaque to the merge.
    #[serde(rename = "type")]
    pub kind: String,
    pub help: String,
    pub label_names: Vec<String>,
    pub samples: Vec<Sample>,
}

impl MetricFamily {
    /// Identity used to match families across snapshots.
    pub fn key(&self) -> FamilyKey {
        FamilyKey {
            name: self.name.clone(),
            label_names: self.label_names.iter().cloned().collect(),
        }
    }

    pub fn has_label_names(&self) -> bool {
        !self.label_names.is_empty()
    }
}

// ── FamilyKey ─────────────────────────────────────────────────────

/// Family name plus its label names as an unordered set.
///
/// `["method", "code"]` and `["code", "method"]` produce equal keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FamilyKey {
    pub name: String,
    pub label_names: BTreeSet<String>,
}

impl fmt::Display for FamilyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.name)?;
        for (i, label) in self.label_names.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(label)?;
        }
        f.write_str("}")
    }
}

/// Serde adapter for sample values.
///
/// JSON has no representation for NaN or infinities, and `serde_json` would
/// silently write them as `null`. They are written as the exposition-format
/// tokens instead, and read back from either a number or a token.
mod sample_value {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if value.is_sign_positive() {
            serializer.serialize_str("+Inf")
        } else {
            serializer.serialize_str("-Inf")
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Token(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(value),
            Repr::Token(token) => match token.as_str() {
                "NaN" => Ok(f64::NAN),
                "+Inf" | "Inf" => Ok(f64::INFINITY),
                "-Inf" => Ok(f64::NEG_INFINITY),
                other => Err(D::Error::custom(format!(
                    "invalid sample value {other:?}, expected a number, \"NaN\", \"+Inf\" or \"-Inf\""
                ))),
            },
        }
    }
}

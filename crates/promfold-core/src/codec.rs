//! JSON codec for snapshot and state documents.
//!
//! A document is an array of [`MetricFamily`] objects. Decoding separates
//! bytes that are not JSON at all ([`CodecError::Corrupt`]) from JSON that
//! does not fit the schema ([`CodecError::is_schema`]).

use serde_json::Value;

use crate::error::{CodecError, CodecResult};
use crate::types::MetricFamily;

/// Decode a snapshot or state document.
///
/// An empty JSON object (`{}`) is read as an empty family list; older state
/// files were initialized that way.
pub fn decode(bytes: &[u8]) -> CodecResult<Vec<MetricFamily>> {
    let document: Value = serde_json::from_slice(bytes).map_err(CodecError::Corrupt)?;
    if document.as_object().is_some_and(|object| object.is_empty()) {
        return Ok(Vec::new());
    }

    let families: Vec<MetricFamily> =
        serde_json::from_value(document).map_err(CodecError::Schema)?;
    validate(&families)?;
    Ok(families)
}

/// Encode families as a compact JSON array.
pub fn encode(families: &[MetricFamily]) -> CodecResult<Vec<u8>> {
    serde_json::to_vec(families).map_err(CodecError::Encode)
}

/// Encode families as indented JSON, for inspection.
pub fn encode_pretty(families: &[MetricFamily]) -> CodecResult<Vec<u8>> {
    serde_json::to_vec_pretty(families).map_err(CodecError::Encode)
}

fn validate(families: &[MetricFamily]) -> CodecResult<()> {
    for family in families {
        for sample in &family.samples {
            if sample.label_names.len() != sample.label_values.len() {
                return Err(CodecError::LabelArity {
                    family: family.name.clone(),
                    sample: sample.name.clone(),
                    names: sample.label_names.len(),
                    values: sample.label_values.len(),
                });
            }
            if let Some(label) = sample.duplicate_label() {
                return Err(CodecError::DuplicateLabel {
                    family: family.name.clone(),
                    sample: sample.name.clone(),
                    label: label.to_string(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sample;

    const SNAPSHOT: &str = r#"[
        {
            "name": "http_requests",
            "type": "counter",
            "help": "HTTP requests served.",
            "labelNames": ["method"],
            "samples": [
                {"name": "http_requests", "labelNames": ["method"], "labelValues": ["GET"], "value": 2}
            ]
        }
    ]"#;

    #[test]
    fn decode_snapshot() {
        let families = decode(SNAPSHOT.as_bytes()).unwrap();
        assert_eq!(families.len(), 1);

        let family = &families[0];
        assert_eq!(family.name, "http_requests");
        assert_eq!(family.kind, "counter");
        assert_eq!(family.label_names, vec!["method"]);
        assert_eq!(family.samples[0].label_values, vec!["GET"]);
        assert_eq!(family.samples[0].value, 2.0);
    }

    #[test]
    fn decode_empty_array_and_legacy_object() {
        assert!(decode(b"[]").unwrap().is_empty());
        assert!(decode(b" {} ").unwrap().is_empty());
    }

    #[test]
    fn invalid_json_is_corrupt() {
        let err = decode(b"[{\"name\": ").unwrap_err();
        assert!(matches!(err, CodecError::Corrupt(_)), "{err}");
        assert!(!err.is_schema());

        let err = decode(b"").unwrap_err();
        assert!(matches!(err, CodecError::Corrupt(_)), "{err}");
    }

    #[test]
    fn missing_field_is_schema_error() {
        let err = decode(br#"[{"name": "up", "type": "gauge", "labelNames": [], "samples": []}]"#)
            .unwrap_err();
        assert!(err.is_schema(), "{err}");
        assert!(err.to_string().contains("help"), "{err}");
    }

    #[test]
    fn non_array_document_is_schema_error() {
        assert!(decode(br#"{"name": "up"}"#).unwrap_err().is_schema());
        assert!(decode(b"42").unwrap_err().is_schema());
    }

    #[test]
    fn label_arity_mismatch_rejected() {
        let doc = br#"[{"name": "up", "type": "gauge", "help": "", "labelNames": ["job"],
            "samples": [{"name": "up", "labelNames": ["job"], "labelValues": [], "value": 1}]}]"#;
        let err = decode(doc).unwrap_err();
        assert!(
            matches!(err, CodecError::LabelArity { names: 1, values: 0, .. }),
            "{err}"
        );
    }

    #[test]
    fn duplicate_label_rejected() {
        let doc = br#"[{"name": "up", "type": "gauge", "help": "", "labelNames": ["job"],
            "samples": [{"name": "up", "labelNames": ["job", "job"], "labelValues": ["a", "b"], "value": 1}]}]"#;
        assert!(matches!(
            decode(doc).unwrap_err(),
            CodecError::DuplicateLabel { ref label, .. } if label == "job"
        ));
    }

    #[test]
    fn encode_then_decode_preserves_families() {
        let families = vec![MetricFamily {
            name: "queue_depth".to_string(),
            kind: "gauge".to_string(),
            help: "Jobs waiting.".to_string(),
            label_names: vec!["queue".to_string()],
            samples: vec![Sample::new(
                "queue_depth",
                vec!["queue".to_string()],
                vec!["mail".to_string()],
                f64::NEG_INFINITY,
            )],
        }];

        let bytes = encode(&families).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("\"type\":\"gauge\""), "{text}");
        assert!(text.contains("\"labelValues\":[\"mail\"]"), "{text}");

        assert_eq!(decode(&bytes).unwrap(), families);
        assert_eq!(decode(&encode_pretty(&families).unwrap()).unwrap(), families);
    }
}

//! Worker snapshot cycles through the public store API.
//!
//! Two workers drop snapshot files into a spool directory; the store folds
//! them into the state file the exporter reads.

use std::fs;
use std::path::Path;

use promfold_store::{MetricFamily, StateStore, load_state};
use serde_json::json;

fn write_snapshot(path: &Path, samples: &[(&str, f64)]) {
    let doc = json!([{
        "name": "http_requests",
        "type": "counter",
        "help": "HTTP requests served.",
        "labelNames": ["method"],
        "samples": samples.iter().map(|(method, value)| json!({
            "name": "http_requests",
            "labelNames": ["method"],
            "labelValues": [method],
            "value": value,
        })).collect::<Vec<_>>(),
    }]);
    fs::write(path, serde_json::to_vec(&doc).unwrap()).unwrap();
}

fn value_of(families: &[MetricFamily], method: &str) -> Option<f64> {
    families
        .iter()
        .find(|f| f.name == "http_requests")?
        .samples
        .iter()
        .find(|s| s.label_values == [method])
        .map(|s| s.value)
}

#[test]
fn two_workers_accumulate_known_samples_only() {
    let root = tempfile::tempdir().unwrap();
    let state_path = root.path().join("state.json");
    let spool = root.path().join("spool");
    fs::create_dir(&spool).unwrap();

    let mut store = StateStore::open(&state_path).unwrap();
    assert!(store.families().is_empty());

    // Worker A reports GET=2.
    write_snapshot(&spool.join("worker-a.json"), &[("GET", 2.0)]);
    let report = store.ingest_directory(&spool, true).unwrap();
    assert!(report.is_clean());
    assert_eq!(report.families.len(), 1);
    assert_eq!(report.families[0].samples.len(), 1);
    assert_eq!(value_of(&report.families, "GET"), Some(2.0));
    assert!(!spool.join("worker-a.json").exists());

    // Worker B reports GET=3 and a new POST series.
    write_snapshot(&spool.join("worker-b.json"), &[("GET", 3.0), ("POST", 1.0)]);
    let report = store.ingest_directory(&spool, true).unwrap();
    assert_eq!(value_of(&report.families, "GET"), Some(5.0));
    assert_eq!(value_of(&report.families, "POST"), None);

    store.persist().unwrap();
    let persisted = load_state(&state_path).unwrap();
    assert_eq!(persisted, report.families);
}

#[test]
fn restart_continues_from_persisted_state() {
    let root = tempfile::tempdir().unwrap();
    let state_path = root.path().join("state.json");
    let snapshot = root.path().join("snap.json");

    {
        let mut store = StateStore::open(&state_path).unwrap();
        write_snapshot(&snapshot, &[("GET", 4.0)]);
        store.ingest_file(&snapshot, true).unwrap();
        store.persist().unwrap();
    }

    let mut store = StateStore::open(&state_path).unwrap();
    assert_eq!(value_of(store.families(), "GET"), Some(4.0));

    write_snapshot(&snapshot, &[("GET", 1.0)]);
    let families = store.ingest_file(&snapshot, true).unwrap();
    assert_eq!(value_of(families, "GET"), Some(5.0));
}

#[test]
fn unsaved_ingestion_is_not_persisted() {
    let root = tempfile::tempdir().unwrap();
    let state_path = root.path().join("state.json");
    let snapshot = root.path().join("snap.json");

    let mut store = StateStore::open(&state_path).unwrap();
    write_snapshot(&snapshot, &[("GET", 4.0)]);
    store.ingest_file(&snapshot, false).unwrap();

    assert_eq!(store.families().len(), 1);
    assert!(load_state(&state_path).unwrap().is_empty());
}

use anyhow::bail;
use promfold_store::{IngestReport, StateStore};
use tracing::info;

use crate::config::Settings;

/// Run a single ingestion cycle and report the outcome.
pub fn ingest(settings: &Settings) -> anyhow::Result<()> {
    let mut store = StateStore::open(&settings.state_file)?;
    let report = cycle(&mut store, settings)?;

    println!(
        "✓ Merged {} snapshot(s) into {}",
        report.merged.len(),
        settings.state_file.display()
    );
    println!("  Families: {}", report.families.len());
    if !report.missed.is_empty() {
        println!("  Missed:   {} (removed before they were read)", report.missed.len());
    }
    if !report.skipped.is_empty() {
        println!("  Skipped:  {} (not regular files)", report.skipped.len());
    }

    if !report.is_clean() {
        for failure in &report.failures {
            eprintln!("  ✗ {}", failure.error);
        }
        bail!("{} snapshot file(s) could not be ingested", report.failures.len());
    }
    Ok(())
}

/// Fold the spool directory into `store` and persist the result.
pub fn cycle(store: &mut StateStore, settings: &Settings) -> anyhow::Result<IngestReport> {
    let report = store.ingest_directory(&settings.spool_dir, settings.consume)?;
    store.persist()?;
    info!(
        merged = report.merged.len(),
        missed = report.missed.len(),
        skipped = report.skipped.len(),
        failed = report.failures.len(),
        families = report.families.len(),
        "ingestion cycle complete"
    );
    Ok(report)
}

use promfold_store::StateStore;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::commands::ingest::cycle;
use crate::config::Settings;

/// Run ingestion cycles until Ctrl-C.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let mut store = StateStore::open(&settings.state_file)?;
    info!(path = ?settings.state_file, families = store.families().len(), "state store opened");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for Ctrl-C; running until killed");
                // Keep the sender alive so the loop does not see a shutdown.
                std::future::pending::<()>().await;
            }
        }
    });

    run_until(&mut store, &settings, shutdown_rx).await;
    info!("promfold stopped");
    Ok(())
}

/// Run ingestion cycles on `settings.interval` until `shutdown` changes,
/// then run one final cycle.
pub async fn run_until(
    store: &mut StateStore,
    settings: &Settings,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(
        interval_secs = settings.interval.as_secs(),
        spool = ?settings.spool_dir,
        consume = settings.consume,
        "ingestion loop started"
    );

    let mut ticker = tokio::time::interval(settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = cycle(store, settings) {
                    error!(error = %e, "ingestion cycle failed");
                }
            }
            _ = shutdown.changed() => {
                info!("ingestion loop shutting down");
                // Final cycle so snapshots written since the last tick are kept.
                if let Err(e) = cycle(store, settings) {
                    error!(error = %e, "final ingestion cycle failed");
                }
                break;
            }
        }
    }
}

//! `relsync watch` – periodic passes until Ctrl-C.

use anyhow::Result;
use relsync_core::config::RelsyncConfig;
use relsync_core::sync::{SyncEngine, SyncTrigger};
use std::sync::Arc;
use std::time::Duration;

pub async fn run_watch(cfg: &RelsyncConfig, interval_secs: Option<u64>) -> Result<()> {
    let interval = interval_secs
        .map(Duration::from_secs)
        .unwrap_or_else(|| cfg.sync_interval());
    if interval.is_zero() {
        anyhow::bail!("sync interval must be at least one second");
    }
    let engine = Arc::new(SyncEngine::from_config(cfg)?);
    let trigger = SyncTrigger::new(engine, interval);

    tracing::info!(
        repo = %cfg.repo.slug(),
        interval_secs = interval.as_secs(),
        "watching for new releases"
    );
    eprintln!(
        "Syncing {} every {}s (Ctrl-C to stop)",
        cfg.repo.slug(),
        interval.as_secs()
    );
    trigger
        .run_periodic(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await;
    Ok(())
}

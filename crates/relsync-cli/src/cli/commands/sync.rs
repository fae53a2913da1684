//! `relsync sync` – one pass.

use anyhow::Result;
use relsync_core::config::RelsyncConfig;
use relsync_core::sync::SyncEngine;

/// Run a single pass. Fails if any release failed, so cron jobs notice.
pub async fn run_sync(cfg: &RelsyncConfig) -> Result<()> {
    let engine = SyncEngine::from_config(cfg)?;
    let report = engine.run().await?;
    println!("{report}");
    for failure in &report.failed {
        eprintln!("  {}: {}", failure.release, failure.error);
    }
    if !report.is_clean() {
        anyhow::bail!("{} release(s) failed to sync", report.failed.len());
    }
    Ok(())
}

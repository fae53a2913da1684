//! `relsync manifest` – print the saved manifest.

use anyhow::Result;
use relsync_core::config::RelsyncConfig;

use super::open_store;

pub async fn run_manifest(cfg: &RelsyncConfig) -> Result<()> {
    let store = open_store(cfg).await?;
    let manifest = store.read().await?;
    let json = manifest.to_json_pretty()?;
    println!("{}", String::from_utf8_lossy(&json));
    Ok(())
}

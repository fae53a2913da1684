//! `relsync resolve [channel]` – print the file a channel points at.

use anyhow::Result;
use relsync_core::config::RelsyncConfig;

use super::open_store;

pub async fn run_resolve(cfg: &RelsyncConfig, channel: &str) -> Result<()> {
    let store = open_store(cfg).await?;
    let path = store.resolve(channel)?;
    println!("{path}");
    Ok(())
}

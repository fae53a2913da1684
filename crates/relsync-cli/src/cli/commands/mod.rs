//! CLI command handlers, one per file.

mod checksum;
mod completions;
mod manifest;
mod resolve;
mod sync;
mod watch;

pub use checksum::run_checksum;
pub use completions::run_completions;
pub use manifest::run_manifest;
pub use resolve::run_resolve;
pub use sync::run_sync;
pub use watch::run_watch;

use relsync_core::config::RelsyncConfig;
use relsync_core::manifest::{LoadOutcome, ManifestStore};

/// Store for the configured storage dir, loaded from disk.
async fn open_store(cfg: &RelsyncConfig) -> anyhow::Result<ManifestStore> {
    let store = ManifestStore::new(&cfg.storage_dir, cfg.read_timeout());
    match store.load().await {
        LoadOutcome::Loaded | LoadOutcome::Missing => Ok(store),
        outcome => anyhow::bail!(
            "cannot use manifest at {} ({outcome:?}); see the log for details",
            store.path().display()
        ),
    }
}

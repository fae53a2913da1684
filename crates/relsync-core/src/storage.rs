//! Disk I/O helpers for the storage root.
//!
//! Every file that readers may observe (cached assets, the manifest) is first
//! written under a `.part` sibling and then renamed over its final name, so a
//! crash or failed transfer never leaves a truncated file in place.

use std::io;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `app.exe` → `app.exe.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Write `data` to `final_path` via a synced temp file and a rename.
/// Creates the parent directory if needed. Fails if the rename crosses filesystems.
pub async fn replace_atomically(final_path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = final_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = temp_path(final_path);
    let written = async {
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(data).await?;
        file.sync_all().await
    }
    .await;
    if let Err(e) = written {
        discard(&tmp).await;
        return Err(e);
    }
    finalize(&tmp, final_path).await
}

/// Rename a finished temp file onto its final path, replacing any previous content.
pub async fn finalize(temp: &Path, final_path: &Path) -> io::Result<()> {
    match tokio::fs::rename(temp, final_path).await {
        Ok(()) => Ok(()),
        Err(e) => {
            discard(temp).await;
            Err(e)
        }
    }
}

/// Best-effort removal of a leftover temp file.
pub async fn discard(temp: &Path) {
    if let Err(e) = tokio::fs::remove_file(temp).await {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::debug!(path = %temp.display(), error = %e, "could not remove temp file");
        }
    }
}

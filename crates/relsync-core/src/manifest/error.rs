//! Error types for manifest persistence and channel resolution.

use std::path::PathBuf;
use std::time::Duration;

/// Failure saving or reading the manifest. Load failures are not errors: they
/// are logged and reported as a [`LoadOutcome`](super::LoadOutcome).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("write manifest {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialize manifest: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The last load hit an I/O error other than "not found"; overwriting
    /// could destroy a manifest we simply failed to read.
    #[error("refusing to overwrite {}: it could not be read on the last load", path.display())]
    SaveRefused { path: PathBuf },
    #[error("manifest write still in progress after {0:?}")]
    ReadTimeout(Duration),
}

/// Channel resolution failure, returned to the serving layer as "not found".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("channel not found: {0}")]
    ChannelNotFound(String),
    /// A channel points at a version with no registered file.
    #[error("no file registered for version {version} (channel {channel})")]
    FileNotFound { channel: String, version: String },
}

//! Error types for a sync pass.

use crate::descriptor::DescriptorError;
use crate::manifest::StoreError;
use crate::retry::FetchError;

/// Failure of one release. Logged and recorded in the report; the pass
/// moves on to the next release.
#[derive(Debug, thiserror::Error)]
pub enum ReleaseError {
    #[error("download {asset}: {source}")]
    Download {
        asset: String,
        #[source]
        source: FetchError,
    },
    #[error("asset name {0:?} is not usable as a file name")]
    InvalidAssetName(String),
    #[error("release has no descriptor asset matching {0:?}")]
    MissingDescriptor(String),
    #[error("release has no installer asset matching {0:?}")]
    MissingInstaller(String),
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
    #[error("descriptor for {version} declares no sha2 checksum")]
    MissingChecksum { version: String },
    #[error("sha256 mismatch for {version}: descriptor declares {expected}, installer hashes to {actual}")]
    ChecksumMismatch {
        version: String,
        expected: String,
        actual: String,
    },
    #[error("hash installer: {0:#}")]
    Hash(anyhow::Error),
}

/// Failure that aborts the whole pass.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("list releases: {0}")]
    Listing(#[source] FetchError),
    #[error("prepare storage root: {0}")]
    Storage(#[source] std::io::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("a sync pass is already running")]
    AlreadyRunning,
}

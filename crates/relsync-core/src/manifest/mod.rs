//! The manifest: known channels and verified, cached files.
//!
//! Persisted as `versions.json` in the storage root:
//!
//! ```json
//! {
//!     "channels": { "latest": { "name": "latest", "version": "1.0.0" } },
//!     "files": [ { "version": "1.0.0", "path": "App-Setup-1.0.0.exe", "sha256": "…", "added": 1500000000000 } ]
//! }
//! ```

mod error;
mod store;

pub use error::{ResolveError, StoreError};
pub use store::{LoadOutcome, ManifestStore, WriteGuard, MANIFEST_FILE};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Name of the channel that tracks the newest synced release.
pub const LATEST_CHANNEL: &str = "latest";

/// Named pointer to a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    pub version: String,
}

/// One verified artifact in the storage root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub version: String,
    /// Path relative to the storage root.
    pub path: String,
    /// Lowercase hex SHA-256 of the file content.
    pub sha256: String,
    /// Registration time, Unix epoch milliseconds.
    pub added: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub channels: BTreeMap<String, Channel>,
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

impl Manifest {
    /// Upsert a channel by name.
    pub fn add_channel(&mut self, name: &str, version: &str) -> Channel {
        let channel = Channel {
            name: name.to_string(),
            version: version.to_string(),
        };
        self.channels.insert(name.to_string(), channel.clone());
        channel
    }

    /// Register a file, replacing any previous entry for the same version.
    pub fn add_file(&mut self, version: &str, path: &str, sha256: &str) -> FileEntry {
        self.files.retain(|f| f.version != version);
        let file = FileEntry {
            version: version.to_string(),
            path: path.to_string(),
            sha256: sha256.to_string(),
            added: now_millis(),
        };
        self.files.push(file.clone());
        file
    }

    pub fn file_for_version(&self, version: &str) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.version == version)
    }

    pub fn file_by_path(&self, path: &str) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Resolve a channel to the file its version points at.
    pub fn resolve_channel(&self, name: &str) -> Result<&FileEntry, ResolveError> {
        let channel = self
            .channels
            .get(name)
            .ok_or_else(|| ResolveError::ChannelNotFound(name.to_string()))?;
        self.file_for_version(&channel.version)
            .ok_or_else(|| ResolveError::FileNotFound {
                channel: name.to_string(),
                version: channel.version.clone(),
            })
    }

    /// Pretty JSON with four-space indentation.
    pub fn to_json_pretty(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut ser)?;
        Ok(out)
    }
}

/// Current time as Unix milliseconds.
pub(crate) fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

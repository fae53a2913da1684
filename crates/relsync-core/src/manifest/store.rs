//! Durable manifest storage with a consistent read view.
//!
//! The sync engine mutates a working copy; readers only ever see the last
//! published snapshot (an `Arc<Manifest>` swapped after a successful load or
//! save), so a partially mutated manifest is never exposed. A `watch` counter
//! marks writes in flight: [`ManifestStore::snapshot`] never waits on it,
//! [`ManifestStore::read`] waits for it to drop to zero with a bounded timeout.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::error::{ResolveError, StoreError};
use super::{now_millis, Channel, FileEntry, Manifest};
use crate::storage;

/// File name of the manifest inside the storage root.
pub const MANIFEST_FILE: &str = "versions.json";

/// What the last [`ManifestStore::load`] found on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Document parsed and replaced the in-memory state.
    Loaded,
    /// No document yet (first run); in-memory state kept.
    Missing,
    /// Document exists but is not a valid manifest; it is moved aside before
    /// the next save overwrites it.
    Malformed,
    /// Reading failed for another reason (permissions, I/O); saves are refused
    /// until a later load succeeds.
    Unreadable,
}

pub struct ManifestStore {
    root: PathBuf,
    path: PathBuf,
    working: Mutex<Manifest>,
    published: RwLock<Arc<Manifest>>,
    writers: watch::Sender<usize>,
    last_load: Mutex<Option<LoadOutcome>>,
    read_timeout: Duration,
}

/// Marks a manifest write as in progress for as long as it is alive.
pub struct WriteGuard<'a> {
    writers: &'a watch::Sender<usize>,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.writers.send_modify(|n| *n = n.saturating_sub(1));
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ManifestStore {
    /// Store for `<root>/versions.json`. Nothing is read until [`load`](Self::load).
    pub fn new(root: impl Into<PathBuf>, read_timeout: Duration) -> Self {
        let root = root.into();
        let path = root.join(MANIFEST_FILE);
        let (writers, _) = watch::channel(0usize);
        Self {
            root,
            path,
            working: Mutex::new(Manifest::default()),
            published: RwLock::new(Arc::new(Manifest::default())),
            writers,
            last_load: Mutex::new(None),
            read_timeout,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True while a load or save (or an explicit [`write_guard`](Self::write_guard)) is running.
    pub fn is_writing(&self) -> bool {
        *self.writers.borrow() > 0
    }

    /// Mark a write as in progress until the guard is dropped.
    pub fn write_guard(&self) -> WriteGuard<'_> {
        self.writers.send_modify(|n| *n += 1);
        WriteGuard {
            writers: &self.writers,
        }
    }

    pub fn last_load(&self) -> Option<LoadOutcome> {
        *lock(&self.last_load)
    }

    /// Read `versions.json` and replace the in-memory state.
    ///
    /// Never fails: a missing or broken document is logged and the current
    /// state is kept, so an empty manifest is valid on first run.
    pub async fn load(&self) -> LoadOutcome {
        let _guard = self.write_guard();
        let outcome = match tokio::fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice::<Manifest>(&bytes) {
                Ok(manifest) => {
                    debug!(
                        path = %self.path.display(),
                        channels = manifest.channels.len(),
                        files = manifest.files.len(),
                        "manifest loaded"
                    );
                    *lock(&self.working) = manifest.clone();
                    self.publish(manifest);
                    LoadOutcome::Loaded
                }
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "manifest is malformed, keeping current state");
                    LoadOutcome::Malformed
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no manifest yet, starting empty");
                LoadOutcome::Missing
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "manifest could not be read");
                LoadOutcome::Unreadable
            }
        };
        *lock(&self.last_load) = Some(outcome);
        outcome
    }

    /// Write channels and files to `versions.json` (temp file + rename), then
    /// publish them to readers.
    pub async fn save(&self) -> Result<(), StoreError> {
        let _guard = self.write_guard();
        let last_load = self.last_load();
        if last_load == Some(LoadOutcome::Unreadable) {
            return Err(StoreError::SaveRefused {
                path: self.path.clone(),
            });
        }

        let manifest = lock(&self.working).clone();
        let bytes = manifest.to_json_pretty()?;

        if last_load == Some(LoadOutcome::Malformed) {
            self.preserve_malformed().await?;
        }
        storage::replace_atomically(&self.path, &bytes)
            .await
            .map_err(|source| StoreError::Save {
                path: self.path.clone(),
                source,
            })?;

        if last_load.is_some() {
            *lock(&self.last_load) = Some(LoadOutcome::Loaded);
        }
        debug!(
            path = %self.path.display(),
            files = manifest.files.len(),
            "manifest saved"
        );
        self.publish(manifest);
        Ok(())
    }

    /// Move an unparseable manifest to `versions.json.corrupt-<millis>` so
    /// saving does not destroy it.
    async fn preserve_malformed(&self) -> Result<(), StoreError> {
        let mut aside = self.path.as_os_str().to_owned();
        aside.push(format!(".corrupt-{}", now_millis()));
        let aside = PathBuf::from(aside);
        match tokio::fs::rename(&self.path, &aside).await {
            Ok(()) => {
                warn!(from = %self.path.display(), to = %aside.display(), "moved malformed manifest aside");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Save {
                path: aside,
                source,
            }),
        }
    }

    fn publish(&self, manifest: Manifest) {
        let mut published = self
            .published
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *published = Arc::new(manifest);
    }

    /// Upsert a channel in the working copy. Visible to readers after the next save.
    pub fn add_channel(&self, name: &str, version: &str) -> Channel {
        lock(&self.working).add_channel(name, version)
    }

    /// Register a file in the working copy, replacing any entry for the same version.
    pub fn add_file(&self, version: &str, path: &str, sha256: &str) -> FileEntry {
        lock(&self.working).add_file(version, path, sha256)
    }

    /// Working-copy entry whose path matches `rel_path`.
    pub fn recorded_file(&self, rel_path: &str) -> Option<FileEntry> {
        lock(&self.working).file_by_path(rel_path).cloned()
    }

    /// Working-copy entry for `version`.
    pub fn file_for_version(&self, version: &str) -> Option<FileEntry> {
        lock(&self.working).file_for_version(version).cloned()
    }

    /// Last published state. Never waits, even while a write is in progress.
    pub fn snapshot(&self) -> Arc<Manifest> {
        let published = self
            .published
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&published)
    }

    /// Independent copy of the manifest once no write is in flight.
    /// Waits at most the configured read timeout.
    pub async fn read(&self) -> Result<Manifest, StoreError> {
        let mut rx = self.writers.subscribe();
        let settled = tokio::time::timeout(self.read_timeout, async move {
            let _ = rx.wait_for(|writers| *writers == 0).await;
        })
        .await;
        match settled {
            Ok(()) => Ok(self.snapshot().as_ref().clone()),
            Err(_) => Err(StoreError::ReadTimeout(self.read_timeout)),
        }
    }

    /// Relative path of the file the channel points at, from the published state.
    pub fn resolve(&self, channel: &str) -> Result<String, ResolveError> {
        let snapshot = self.snapshot();
        snapshot.resolve_channel(channel).map(|f| f.path.clone())
    }
}

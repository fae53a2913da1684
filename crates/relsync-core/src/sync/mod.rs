//! Sync engine: one pass mirrors the release feed into the storage root.
//!
//! A pass loads the manifest, lists releases, processes them oldest first
//! (assets of one release download concurrently and are joined before the
//! release is registered), points `latest` at the top-level descriptor's
//! version and saves the manifest. A failing release is logged and skipped;
//! only listing and saving failures abort the pass.

mod error;
mod report;
mod trigger;


pub use error::{ReleaseError, SyncError};
pub use report::{ReleaseFailure, SyncReport};
pub use trigger::{SyncTrigger, MIN_INTERVAL};

use anyhow::Context;
use futures_util::future::join_all;
use regex::Regex;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info, warn};

use crate::checksum;
use crate::config::{RelsyncConfig, DEFAULT_DESCRIPTOR_NAME};
use crate::descriptor::{self, DescriptorError};
use crate::manifest::{ManifestStore, LATEST_CHANNEL};
use crate::naming;
use crate::remote::{AssetFetcher, CurlFetcher, GithubReleases, Release, ReleaseAsset, ReleaseSource};
use crate::retry::RetryPolicy;

/// Where a pass currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    LoadingManifest,
    ListingReleases,
    ProcessingReleases,
    SavingManifest,
}

/// What the engine syncs and how it recognizes release assets.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// `owner/name`, for log lines.
    pub repo_slug: String,
    pub sync_prereleases: bool,
    /// Substring of the descriptor asset name; also the top-level descriptor file.
    pub descriptor_name: String,
    pub installer_pattern: Regex,
}

impl SyncOptions {
    /// Options with the default descriptor name and the given installer pattern.
    pub fn new(repo_slug: impl Into<String>, installer_pattern: Regex) -> Self {
        Self {
            repo_slug: repo_slug.into(),
            sync_prereleases: false,
            descriptor_name: DEFAULT_DESCRIPTOR_NAME.to_string(),
            installer_pattern,
        }
    }

    pub fn from_config(cfg: &RelsyncConfig) -> anyhow::Result<Self> {
        let installer_pattern = Regex::new(&cfg.installer_pattern)
            .with_context(|| format!("invalid installer_pattern {:?}", cfg.installer_pattern))?;
        Ok(Self {
            repo_slug: cfg.repo.slug(),
            sync_prereleases: cfg.sync_prereleases,
            descriptor_name: cfg.descriptor_name.clone(),
            installer_pattern,
        })
    }
}

/// An asset resolved to a local file, fetched or served from cache.
#[derive(Debug, Clone)]
struct LocalAsset {
    name: String,
    /// Path relative to the storage root (the sanitized asset name).
    rel_path: String,
    path: PathBuf,
    cached: bool,
}

/// Reverse the feed (newest first) into processing order and drop
/// pre-releases unless they are wanted. Drafts are always kept.
/// Returns the retained releases and how many were skipped.
pub fn select_releases(releases: Vec<Release>, sync_prereleases: bool) -> (Vec<Release>, usize) {
    let total = releases.len();
    let retained: Vec<Release> = releases
        .into_iter()
        .rev()
        .filter(|release| {
            if release.draft || !release.prerelease || sync_prereleases {
                return true;
            }
            info!(release = release.display_name(), "pre-release, skipping");
            false
        })
        .collect();
    let skipped = total - retained.len();
    (retained, skipped)
}

pub struct SyncEngine {
    store: Arc<ManifestStore>,
    source: Arc<dyn ReleaseSource>,
    fetcher: Arc<dyn AssetFetcher>,
    options: SyncOptions,
    phase: Mutex<SyncPhase>,
    pass: tokio::sync::Mutex<()>,
}

impl SyncEngine {
    pub fn new(
        store: Arc<ManifestStore>,
        source: Arc<dyn ReleaseSource>,
        fetcher: Arc<dyn AssetFetcher>,
        options: SyncOptions,
    ) -> Self {
        Self {
            store,
            source,
            fetcher,
            options,
            phase: Mutex::new(SyncPhase::Idle),
            pass: tokio::sync::Mutex::new(()),
        }
    }

    /// Engine for the configured GitHub repository, downloading with libcurl.
    pub fn from_config(cfg: &RelsyncConfig) -> anyhow::Result<Self> {
        cfg.validate()?;
        let retry = cfg
            .retry
            .as_ref()
            .map(RetryPolicy::from)
            .unwrap_or_default();
        let store = Arc::new(ManifestStore::new(&cfg.storage_dir, cfg.read_timeout()));
        let source = Arc::new(GithubReleases::new(&cfg.repo, cfg.api_base(), retry));
        let fetcher = Arc::new(CurlFetcher::new(retry));
        Ok(Self::new(store, source, fetcher, SyncOptions::from_config(cfg)?))
    }

    pub fn store(&self) -> &Arc<ManifestStore> {
        &self.store
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub fn phase(&self) -> SyncPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, phase: SyncPhase) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = phase;
    }

    /// True while a pass holds the engine.
    pub fn is_running(&self) -> bool {
        self.pass.try_lock().is_err()
    }

    /// Run one pass, waiting for a pass already in progress to finish first.
    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        let _pass = self.pass.lock().await;
        self.run_locked().await
    }

    /// Run one pass unless another is in progress.
    pub async fn try_run(&self) -> Result<SyncReport, SyncError> {
        let _pass = self.pass.try_lock().map_err(|_| SyncError::AlreadyRunning)?;
        self.run_locked().await
    }

    async fn run_locked(&self) -> Result<SyncReport, SyncError> {
        info!(repo = %self.options.repo_slug, "synchronizing");
        let result = self.run_pass().await;
        self.set_phase(SyncPhase::Idle);
        match &result {
            Ok(report) => info!(repo = %self.options.repo_slug, "synchronized: {}", report),
            Err(e) => error!(repo = %self.options.repo_slug, error = %e, "sync pass failed"),
        }
        result
    }

    async fn run_pass(&self) -> Result<SyncReport, SyncError> {
        self.set_phase(SyncPhase::LoadingManifest);
        tokio::fs::create_dir_all(self.store.root())
            .await
            .map_err(SyncError::Storage)?;
        self.store.load().await;

        self.set_phase(SyncPhase::ListingReleases);
        let releases = self
            .source
            .list_releases()
            .await
            .map_err(SyncError::Listing)?;

        self.set_phase(SyncPhase::ProcessingReleases);
        let mut report = SyncReport {
            releases_seen: releases.len(),
            ..SyncReport::default()
        };
        let (retained, skipped) = select_releases(releases, self.options.sync_prereleases);
        report.releases_skipped = skipped;

        for release in &retained {
            match self.sync_release(release, &mut report).await {
                Ok(version) => report.synced.push(version),
                Err(e) => {
                    error!(release = release.display_name(), error = %e, "release failed");
                    report.failed.push(ReleaseFailure {
                        release: release.display_name().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        report.latest = self.update_latest_channel().await;

        self.set_phase(SyncPhase::SavingManifest);
        self.store.save().await?;
        Ok(report)
    }

    /// Download, verify and register one release. Returns the registered version.
    async fn sync_release(
        &self,
        release: &Release,
        report: &mut SyncReport,
    ) -> Result<String, ReleaseError> {
        info!(
            release = release.display_name(),
            assets = release.assets.len(),
            "synchronizing release"
        );

        let results = join_all(release.assets.iter().map(|asset| self.download_asset(asset))).await;
        let mut assets = Vec::with_capacity(results.len());
        for result in results {
            let asset = result?;
            if asset.cached {
                report.cache_hits += 1;
            } else {
                report.downloads += 1;
            }
            assets.push(asset);
        }

        let descriptor_asset = assets
            .iter()
            .find(|a| a.name.contains(&self.options.descriptor_name))
            .ok_or_else(|| ReleaseError::MissingDescriptor(self.options.descriptor_name.clone()))?;
        let installer = assets
            .iter()
            .find(|a| self.options.installer_pattern.is_match(&a.name))
            .ok_or_else(|| {
                ReleaseError::MissingInstaller(self.options.installer_pattern.as_str().to_string())
            })?;

        let descriptor = descriptor::read_descriptor(&descriptor_asset.path).await?;
        let expected = descriptor
            .sha2
            .as_deref()
            .ok_or_else(|| ReleaseError::MissingChecksum {
                version: descriptor.version.clone(),
            })?;
        let actual = checksum::sha256_file(&installer.path)
            .await
            .map_err(ReleaseError::Hash)?;
        if !actual.eq_ignore_ascii_case(expected.trim()) {
            return Err(ReleaseError::ChecksumMismatch {
                version: descriptor.version,
                expected: expected.to_string(),
                actual,
            });
        }

        self.store
            .add_file(&descriptor.version, &installer.rel_path, &actual);
        info!(
            release = release.display_name(),
            version = %descriptor.version,
            path = %installer.rel_path,
            "registered installer"
        );
        Ok(descriptor.version)
    }

    /// Resolve one asset to a local file, skipping the download when the
    /// cached copy still matches the recorded hash.
    async fn download_asset(&self, asset: &ReleaseAsset) -> Result<LocalAsset, ReleaseError> {
        let rel_path = naming::asset_file_name(&asset.name)
            .ok_or_else(|| ReleaseError::InvalidAssetName(asset.name.clone()))?;
        let path = self.store.root().join(&rel_path);

        if self.is_cached(&rel_path, &path).await {
            debug!(asset = %asset.name, "cache hit, skipping download");
            return Ok(LocalAsset {
                name: asset.name.clone(),
                rel_path,
                path,
                cached: true,
            });
        }

        info!(asset = %asset.name, "downloading");
        self.fetcher
            .fetch(&asset.browser_download_url, &path)
            .await
            .map_err(|source| ReleaseError::Download {
                asset: asset.name.clone(),
                source,
            })?;
        Ok(LocalAsset {
            name: asset.name.clone(),
            rel_path,
            path,
            cached: false,
        })
    }

    async fn is_cached(&self, rel_path: &str, path: &std::path::Path) -> bool {
        let Some(recorded) = self.store.recorded_file(rel_path) else {
            return false;
        };
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => {}
            _ => return false,
        }
        match checksum::sha256_file(path).await {
            Ok(actual) if actual.eq_ignore_ascii_case(&recorded.sha256) => true,
            Ok(_) => {
                warn!(path = %path.display(), "cached file changed on disk, downloading again");
                false
            }
            Err(e) => {
                warn!(path = %path.display(), error = %format!("{e:#}"), "cannot hash cached file, downloading again");
                false
            }
        }
    }

    /// Point `latest` at the version named by the top-level descriptor, as
    /// long as that version has a registered file. Returns the channel's
    /// version after the update, if any.
    async fn update_latest_channel(&self) -> Option<String> {
        let path = self.store.root().join(&self.options.descriptor_name);
        let current = || {
            self.store
                .snapshot()
                .channels
                .get(LATEST_CHANNEL)
                .map(|c| c.version.clone())
        };
        let descriptor = match descriptor::read_descriptor(&path).await {
            Ok(d) => d,
            Err(DescriptorError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                warn!(path = %path.display(), "no top-level descriptor, leaving latest unchanged");
                return current();
            }
            Err(e) => {
                warn!(error = %e, "cannot read top-level descriptor, leaving latest unchanged");
                return current();
            }
        };
        if self.store.file_for_version(&descriptor.version).is_none() {
            warn!(
                version = %descriptor.version,
                "top-level descriptor names a version with no verified file, leaving latest unchanged"
            );
            return current();
        }
        self.store.add_channel(LATEST_CHANNEL, &descriptor.version);
        Some(descriptor.version)
    }
}

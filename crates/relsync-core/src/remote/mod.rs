//! Remote side of a sync pass: the release feed and asset downloads.
//!
//! The engine only sees the [`ReleaseSource`] and [`AssetFetcher`] traits.
//! [`GithubReleases`] and [`CurlFetcher`] are the libcurl-backed implementations.

mod fetch;
mod github;
mod http;

pub use fetch::CurlFetcher;
pub use github::GithubReleases;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::retry::FetchError;

/// One published release as listed by the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Display name; GitHub sends `null` for releases created from a bare tag.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl Release {
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.tag_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

/// Lists the releases of the configured repository, newest first.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    async fn list_releases(&self) -> Result<Vec<Release>, FetchError>;
}

/// Downloads one asset to `dest`, replacing any existing file. Returns bytes written.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, FetchError>;
}

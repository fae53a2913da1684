use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default marker for the per-release descriptor asset (electron-builder style `latest.yml`).
pub const DEFAULT_DESCRIPTOR_NAME: &str = "latest.yml";
/// Default pattern for the installer asset of a release. Anchored at the end so
/// sidecar files such as `.exe.blockmap` do not match.
pub const DEFAULT_INSTALLER_PATTERN: &str = r".+?-Setup-.+?\.exe$";
/// Default GitHub REST API root.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per request (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_secs: 0.5,
            max_delay_secs: 30,
        }
    }
}

/// Repository whose releases are mirrored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    pub owner: String,
    pub name: String,
    /// Optional API token; raises the rate limit, not required for public repos.
    #[serde(default)]
    pub token: Option<String>,
}

impl RepoConfig {
    /// `owner/name` form used in log lines and on the command line.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Parse `owner/name`. Both halves must be non-empty.
    pub fn parse_slug(slug: &str) -> Option<(String, String)> {
        let (owner, name) = slug.trim().split_once('/')?;
        let (owner, name) = (owner.trim(), name.trim());
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some((owner.to_string(), name.to_string()))
    }
}

/// Global configuration loaded from `~/.config/relsync/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelsyncConfig {
    /// Include releases flagged as pre-release. Drafts are always included.
    #[serde(default)]
    pub sync_prereleases: bool,
    /// Minimum seconds between two triggered sync passes.
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,
    /// Storage root holding the manifest and cached assets.
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,
    /// Substring identifying the per-release descriptor asset; also the
    /// name of the top-level descriptor in the storage root.
    #[serde(default = "default_descriptor_name")]
    pub descriptor_name: String,
    /// Regular expression matching the installer asset of a release.
    #[serde(default = "default_installer_pattern")]
    pub installer_pattern: String,
    /// How long `read()` waits for an in-flight manifest write before timing out.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Override for the release API root (GitHub Enterprise, tests).
    #[serde(default)]
    pub api_base: Option<String>,
    pub repo: RepoConfig,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

fn default_sync_interval_secs() -> u64 {
    15 * 60
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("assets")
}

fn default_descriptor_name() -> String {
    DEFAULT_DESCRIPTOR_NAME.to_string()
}

fn default_installer_pattern() -> String {
    DEFAULT_INSTALLER_PATTERN.to_string()
}

fn default_read_timeout_ms() -> u64 {
    3000
}

impl Default for RelsyncConfig {
    fn default() -> Self {
        Self {
            sync_prereleases: false,
            sync_interval_secs: default_sync_interval_secs(),
            storage_dir: default_storage_dir(),
            descriptor_name: default_descriptor_name(),
            installer_pattern: default_installer_pattern(),
            read_timeout_ms: default_read_timeout_ms(),
            api_base: None,
            repo: RepoConfig::default(),
            retry: None,
        }
    }
}

impl RelsyncConfig {
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }

    /// Check the settings a sync pass cannot run without.
    pub fn validate(&self) -> Result<()> {
        if self.repo.owner.trim().is_empty() || self.repo.name.trim().is_empty() {
            anyhow::bail!("repository not configured: set repo.owner and repo.name or pass --repo");
        }
        if self.descriptor_name.trim().is_empty() {
            anyhow::bail!("descriptor_name must not be empty");
        }
        regex::Regex::new(&self.installer_pattern)
            .with_context(|| format!("invalid installer_pattern {:?}", self.installer_pattern))?;
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("relsync")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from the default path, creating a default file if none exists.
pub fn load_or_init() -> Result<RelsyncConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = RelsyncConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<RelsyncConfig> {
    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: RelsyncConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

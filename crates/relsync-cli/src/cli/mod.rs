//! CLI for the relsync release mirror.

mod commands;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use relsync_core::config::{self, RelsyncConfig, RepoConfig};
use std::path::PathBuf;

use commands::{
    run_checksum, run_completions, run_manifest, run_resolve, run_sync, run_watch,
};

/// Top-level CLI for the relsync release mirror.
#[derive(Debug, Parser)]
#[command(name = "relsync")]
#[command(about = "relsync: mirror GitHub release installers into a local cache", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Settings that take precedence over the config file.
#[derive(Debug, Default, Args)]
pub struct Overrides {
    /// Read configuration from this file instead of the XDG config path.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Repository to mirror.
    #[arg(long, global = true, value_name = "OWNER/NAME")]
    pub repo: Option<String>,

    /// GitHub API token.
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Directory holding versions.json and the cached assets.
    #[arg(long, global = true, value_name = "DIR")]
    pub storage_dir: Option<PathBuf>,

    /// Also mirror pre-releases.
    #[arg(long, global = true, overrides_with = "no_prereleases")]
    pub prereleases: bool,

    /// Skip pre-releases even if the config enables them.
    #[arg(long, global = true, overrides_with = "prereleases")]
    pub no_prereleases: bool,
}

impl Overrides {
    pub fn apply(&self, cfg: &mut RelsyncConfig) -> Result<()> {
        if let Some(slug) = &self.repo {
            let (owner, name) = RepoConfig::parse_slug(slug)
                .with_context(|| format!("--repo expects OWNER/NAME, got {slug:?}"))?;
            cfg.repo.owner = owner;
            cfg.repo.name = name;
        }
        if let Some(token) = &self.token {
            cfg.repo.token = Some(token.clone());
        }
        if let Some(dir) = &self.storage_dir {
            cfg.storage_dir = dir.clone();
        }
        if self.prereleases {
            cfg.sync_prereleases = true;
        } else if self.no_prereleases {
            cfg.sync_prereleases = false;
        }
        Ok(())
    }

    fn load_config(&self) -> Result<RelsyncConfig> {
        let mut cfg = match &self.config {
            Some(path) => config::load_from_path(path)?,
            None => config::load_or_init()?,
        };
        self.apply(&mut cfg)?;
        Ok(cfg)
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run one sync pass and print its summary.
    Sync,

    /// Sync now, then again every interval until interrupted.
    Watch {
        /// Seconds between passes (default: sync_interval_secs from config).
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,
    },

    /// Print the file a channel points at, relative to the storage dir.
    Resolve {
        /// Channel name.
        #[arg(default_value = "latest")]
        channel: String,
    },

    /// Print the saved manifest as JSON.
    Manifest,

    /// Compute SHA-256 of a file.
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },

    /// Print a shell completion script.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        match &cli.command {
            CliCommand::Checksum { path } => return run_checksum(path).await,
            CliCommand::Completions { shell } => {
                run_completions(*shell);
                return Ok(());
            }
            _ => {}
        }

        let cfg = cli.overrides.load_config()?;
        tracing::debug!(
            repo = %cfg.repo.slug(),
            storage = %cfg.storage_dir.display(),
            "loaded config"
        );

        match cli.command {
            CliCommand::Sync => run_sync(&cfg).await?,
            CliCommand::Watch { interval } => run_watch(&cfg, interval).await?,
            CliCommand::Resolve { channel } => run_resolve(&cfg, &channel).await?,
            CliCommand::Manifest => run_manifest(&cfg).await?,
            CliCommand::Checksum { .. } | CliCommand::Completions { .. } => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;

use super::{parse, parse_cli};
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use clap_complete::Shell;
use std::path::Path;

#[test]
fn cli_parse_sync() {
    match parse(&["relsync", "sync"]) {
        CliCommand::Sync => {}
        other => panic!("expected Sync, got {other:?}"),
    }
}

#[test]
fn cli_parse_watch_default_interval() {
    match parse(&["relsync", "watch"]) {
        CliCommand::Watch { interval } => assert!(interval.is_none()),
        other => panic!("expected Watch, got {other:?}"),
    }
}

#[test]
fn cli_parse_watch_interval() {
    match parse(&["relsync", "watch", "--interval", "60"]) {
        CliCommand::Watch { interval } => assert_eq!(interval, Some(60)),
        other => panic!("expected Watch, got {other:?}"),
    }
}

#[test]
fn cli_parse_resolve_defaults_to_latest() {
    match parse(&["relsync", "resolve"]) {
        CliCommand::Resolve { channel } => assert_eq!(channel, "latest"),
        other => panic!("expected Resolve, got {other:?}"),
    }
}

#[test]
fn cli_parse_resolve_channel() {
    match parse(&["relsync", "resolve", "beta"]) {
        CliCommand::Resolve { channel } => assert_eq!(channel, "beta"),
        other => panic!("expected Resolve, got {other:?}"),
    }
}

#[test]
fn cli_parse_manifest() {
    assert!(matches!(parse(&["relsync", "manifest"]), CliCommand::Manifest));
}

#[test]
fn cli_parse_checksum() {
    match parse(&["relsync", "checksum", "/tmp/Phantom-Setup-1.0.0.exe"]) {
        CliCommand::Checksum { path } => {
            assert_eq!(path, Path::new("/tmp/Phantom-Setup-1.0.0.exe"))
        }
        other => panic!("expected Checksum, got {other:?}"),
    }
}

#[test]
fn cli_parse_completions() {
    match parse(&["relsync", "completions", "bash"]) {
        CliCommand::Completions { shell } => assert_eq!(shell, Shell::Bash),
        other => panic!("expected Completions, got {other:?}"),
    }
}

#[test]
fn global_flags_work_after_the_subcommand() {
    let cli = parse_cli(&[
        "relsync",
        "sync",
        "--repo",
        "evshiron/phantom",
        "--storage-dir",
        "/srv/mirror",
        "--prereleases",
    ]);
    assert_eq!(cli.overrides.repo.as_deref(), Some("evshiron/phantom"));
    assert_eq!(cli.overrides.storage_dir.as_deref(), Some(Path::new("/srv/mirror")));
    assert!(cli.overrides.prereleases);
}

#[test]
fn last_prerelease_flag_wins() {
    let cli = parse_cli(&["relsync", "sync", "--prereleases", "--no-prereleases"]);
    assert!(!cli.overrides.prereleases);
    assert!(cli.overrides.no_prereleases);

    let cli = parse_cli(&["relsync", "sync", "--no-prereleases", "--prereleases"]);
    assert!(cli.overrides.prereleases);
    assert!(!cli.overrides.no_prereleases);
}

#[test]
fn missing_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["relsync"]).is_err());
}

#[test]
fn cli_definition_is_consistent() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
}

use crate::cli::Overrides;
use relsync_core::config::RelsyncConfig;
use std::path::PathBuf;

#[test]
fn overrides_replace_config_values() {
    let overrides = Overrides {
        repo: Some("evshiron/phantom".into()),
        token: Some("ghp_x".into()),
        storage_dir: Some(PathBuf::from("/srv/mirror")),
        prereleases: true,
        ..Overrides::default()
    };
    let mut cfg = RelsyncConfig::default();
    overrides.apply(&mut cfg).unwrap();

    assert_eq!(cfg.repo.owner, "evshiron");
    assert_eq!(cfg.repo.name, "phantom");
    assert_eq!(cfg.repo.token.as_deref(), Some("ghp_x"));
    assert_eq!(cfg.storage_dir, PathBuf::from("/srv/mirror"));
    assert!(cfg.sync_prereleases);
    cfg.validate().unwrap();
}

#[test]
fn absent_overrides_keep_config_values() {
    let mut cfg = RelsyncConfig::default();
    cfg.repo.owner = "acme".into();
    cfg.repo.name = "widget".into();
    cfg.sync_prereleases = true;
    let before = cfg.clone();

    Overrides::default().apply(&mut cfg).unwrap();
    assert_eq!(cfg.repo, before.repo);
    assert_eq!(cfg.storage_dir, before.storage_dir);
    assert!(cfg.sync_prereleases, "--prereleases absent must not turn it off");
}

#[test]
fn malformed_repo_slug_is_an_error() {
    let overrides = Overrides {
        repo: Some("just-a-name".into()),
        ..Overrides::default()
    };
    let err = overrides.apply(&mut RelsyncConfig::default()).unwrap_err();
    assert!(err.to_string().contains("OWNER/NAME"));
}

#[test]
fn no_prereleases_turns_config_setting_off() {
    let mut cfg = RelsyncConfig::default();
    cfg.sync_prereleases = true;
    let overrides = Overrides {
        no_prereleases: true,
        ..Overrides::default()
    };
    overrides.apply(&mut cfg).unwrap();
    assert!(!cfg.sync_prereleases);
}

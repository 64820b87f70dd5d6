// Scaffold tests: shipped defaults and config bootstrapping.

use std::path::PathBuf;

use pickwatch::config::{ensure_config_files, load_config_from, ConfigError};

fn temp_base(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pickwatch_scaffold_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(dir.join("defaults")).unwrap();
    dir
}

/// Verify that defaults/pickwatch.toml is valid TOML with every section.
#[test]
fn default_config_is_valid_toml() {
    let content = std::fs::read_to_string("defaults/pickwatch.toml")
        .expect("defaults/pickwatch.toml should exist");
    let parsed: toml::Value = toml::from_str(&content).expect("defaults/pickwatch.toml is not valid TOML");
    for section in ["league", "sync", "clock", "provider", "database"] {
        assert!(parsed.get(section).is_some(), "missing [{section}] section");
    }
}

/// The shipped defaults name no draft, so a fresh copy must be edited first.
#[test]
fn copied_defaults_require_a_draft_or_league() {
    let base = temp_base("copy");
    std::fs::copy("defaults/pickwatch.toml", base.join("defaults/pickwatch.toml")).unwrap();

    let copied = ensure_config_files(&base).unwrap();
    assert_eq!(copied.len(), 1);
    assert!(base.join("config/pickwatch.toml").exists());

    match load_config_from(&base) {
        Err(ConfigError::ValidationError { field, .. }) => assert_eq!(field, "league.league_id"),
        other => panic!("expected validation error, got {other:?}"),
    }

    let edited = std::fs::read_to_string(base.join("config/pickwatch.toml"))
        .unwrap()
        .replace("draft_id = \"\"", "draft_id = \"1130000000000000000\"");
    std::fs::write(base.join("config/pickwatch.toml"), edited).unwrap();

    let config = load_config_from(&base).unwrap();
    let settings = config.session_settings();
    assert_eq!(settings.draft_id.as_deref(), Some("1130000000000000000"));
    assert!(config.db_path.ends_with("pickwatch.db"));
    let _ = std::fs::remove_dir_all(&base);
}

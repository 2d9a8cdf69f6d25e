//! Configuration file discovery and database path resolution
//!
//! Tests touching COMPATH_CONFIG or COMPATH_DATABASE are marked #[serial]
//! so they never race on the process environment.

use compath_common::config::{
    resolve_config_path, resolve_database_path, TomlConfig, ValidationPolicy, CONFIG_ENV_VAR,
    DATABASE_ENV_VAR,
};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
#[serial]
fn test_database_path_priority() {
    env::remove_var(DATABASE_ENV_VAR);
    let config = TomlConfig {
        database_path: Some(PathBuf::from("/from/toml.db")),
        ..TomlConfig::default()
    };

    // CLI wins over everything
    env::set_var(DATABASE_ENV_VAR, "/from/env.db");
    assert_eq!(
        resolve_database_path(Some(Path::new("/from/cli.db")), &config),
        PathBuf::from("/from/cli.db")
    );

    // Environment wins over TOML
    assert_eq!(resolve_database_path(None, &config), PathBuf::from("/from/env.db"));

    env::remove_var(DATABASE_ENV_VAR);
    assert_eq!(resolve_database_path(None, &config), PathBuf::from("/from/toml.db"));

    let default = resolve_database_path(None, &TomlConfig::default());
    assert!(default.ends_with("compath/compath.db") || default.ends_with("compath_data/compath.db"));
}

#[test]
#[serial]
fn test_config_path_from_environment() {
    env::set_var(CONFIG_ENV_VAR, "/from/env/config.toml");
    assert_eq!(
        resolve_config_path(None),
        Some(PathBuf::from("/from/env/config.toml"))
    );
    assert_eq!(
        resolve_config_path(Some(Path::new("/from/cli.toml"))),
        Some(PathBuf::from("/from/cli.toml"))
    );
    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_missing_config_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.toml");

    let config = TomlConfig::load(Some(&missing)).unwrap();
    assert_eq!(config.port, 5000);
    assert_eq!(config.resources.len(), 4);
}

#[test]
#[serial]
fn test_load_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
        host = "127.0.0.1"
        admin_email = "admin@example.org"

        [import]
        policy = "strict"
        "#,
    )
    .unwrap();

    let config = TomlConfig::load(Some(&path)).unwrap();
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.import.policy, ValidationPolicy::Strict);
    assert_eq!(config.admin_email, "admin@example.org");
    assert!(config.import.curators.is_empty());

    std::fs::write(&path, "port = \"not a number\"").unwrap();
    assert!(TomlConfig::load(Some(&path)).is_err());
}

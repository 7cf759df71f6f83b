//! Configuration loading and code-root resolution
//!
//! Tests touching MDTF_CODE_ROOT are marked #[serial] so they don't race on
//! the process environment.

use mdtf_common::config::{CoreConfig, Tables, CODE_ROOT_ENV};
use serial_test::serial;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
#[serial]
fn test_code_root_from_env() {
    env::set_var(CODE_ROOT_ENV, "/env/mdtf");
    let config = CoreConfig {
        code_root: Some(PathBuf::from("/config/mdtf")),
        ..CoreConfig::default()
    };
    assert_eq!(config.resolve_code_root(None), PathBuf::from("/env/mdtf"));
    assert_eq!(
        config.resolve_code_root(Some(Path::new("/cli/mdtf"))),
        PathBuf::from("/cli/mdtf")
    );
    env::remove_var(CODE_ROOT_ENV);
}

#[test]
#[serial]
fn test_code_root_from_config_then_cwd() {
    env::remove_var(CODE_ROOT_ENV);
    let config = CoreConfig {
        code_root: Some(PathBuf::from("/config/mdtf")),
        ..CoreConfig::default()
    };
    assert_eq!(config.resolve_code_root(None), PathBuf::from("/config/mdtf"));
    assert_eq!(CoreConfig::default().resolve_code_root(None), PathBuf::from("."));
}

#[test]
#[serial]
fn test_empty_env_is_ignored() {
    env::set_var(CODE_ROOT_ENV, "");
    assert_eq!(CoreConfig::default().resolve_code_root(None), PathBuf::from("."));
    env::remove_var(CODE_ROOT_ENV);
}

#[test]
fn test_load_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "fieldlist_dir = \"/etc/mdtf\"\n\n[logging]\nlevel = \"warn\"\n").unwrap();

    let config = CoreConfig::load(&path).unwrap();
    assert_eq!(config.fieldlist_dir, Some(PathBuf::from("/etc/mdtf")));
    assert_eq!(config.logging.level, "warn");
    assert_eq!(CoreConfig::load_or_default(Some(path.as_path())).unwrap(), config);
}

#[test]
fn test_explicit_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    assert!(CoreConfig::load_or_default(Some(dir.path().join("missing.toml").as_path())).is_err());
}

#[test]
fn test_tables_load_from_code_root() {
    let root = TempDir::new().unwrap();
    let tables_dir = root.path().join("src/cmip6-cmor-tables/Tables");
    fs::create_dir_all(&tables_dir).unwrap();
    fs::write(
        tables_dir.join("CMIP6_CV.json"),
        r#"{"CV": {"activity_id": {"CMIP": "CMIP DECK"}, "grid_label": ["gn", "gr1"]}}"#,
    )
    .unwrap();
    fs::write(
        root.path().join("src/fieldlist_GFDL.jsonc"),
        "// GFDL names\n{\"convention_name\": \"GFDL\", \"var_names\": {\"pr\": \"precip\"}}\n",
    )
    .unwrap();

    let tables = Tables::load(&CoreConfig::default(), root.path()).unwrap();
    assert!(tables.vocabulary.is_in_vocabulary("grid_label", "gr1").unwrap());
    assert_eq!(tables.translator.from_cf("GFDL", "pr").unwrap(), vec!["precip"]);
}

#[test]
fn test_tables_load_missing_cv() {
    let root = TempDir::new().unwrap();
    assert!(Tables::load(&CoreConfig::default(), root.path()).is_err());
}

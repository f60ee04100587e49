//! Integration tests for configuration loading.
//!
//! These tests write configuration files in every supported format and
//! verify that loading picks the format from the file extension.

use proctail::{load_config, validate_config, ConfigError, MalformedRegionPolicy, ParserConfig};
use tempfile::tempdir;

#[test]
fn test_load_yaml_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("proctail.yaml");
    std::fs::write(&path, "on_malformed_region: abort\nlog_level: debug\n")
        .expect("Failed to write config");

    let cfg = load_config(Some(path.as_path())).unwrap();
    assert_eq!(cfg.on_malformed_region, MalformedRegionPolicy::Abort);
    assert_eq!(cfg.log_level, "debug");
    assert!(cfg.retain_raw_sections);
}

#[test]
fn test_load_json_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("proctail.json");
    std::fs::write(&path, r#"{"retain_raw_sections": false}"#).expect("Failed to write config");

    let cfg = load_config(Some(path.as_path())).unwrap();
    assert!(!cfg.retain_raw_sections);
    assert_eq!(cfg.on_malformed_region, MalformedRegionPolicy::Skip);
}

#[test]
fn test_load_toml_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("proctail.toml");
    std::fs::write(&path, "on_malformed_region = \"skip\"\nlog_level = \"warn\"\n")
        .expect("Failed to write config");

    let cfg = load_config(Some(path.as_path())).unwrap();
    assert_eq!(cfg.log_level, "warn");
}

#[test]
fn test_load_broken_file_is_an_error() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("proctail.json");
    std::fs::write(&path, "{ not json").expect("Failed to write config");

    assert!(matches!(load_config(Some(path.as_path())), Err(ConfigError::Json(_))));
}

#[test]
fn test_loaded_config_validation() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("proctail.yaml");
    std::fs::write(&path, "log_level: chatty\n").expect("Failed to write config");

    let cfg = load_config(Some(path.as_path())).unwrap();
    assert!(validate_config(&cfg).is_err());
    assert!(validate_config(&ParserConfig::default()).is_ok());
}

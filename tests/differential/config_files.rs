//! Runs driven by configuration files on disk.

use kvformat::{Error, FileType, FormatConfig};
use tempfile::TempDir;

use crate::common::run_clean;

#[test]
fn test_default_config_file_runs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kvformat.toml");
    std::fs::write(&path, FormatConfig::default_toml()).unwrap();

    let mut config = FormatConfig::from_file(&path).unwrap();
    config.rows = 100;
    config.ops = 100;
    config.seed = Some(1);
    let summary = run_clean(config);
    assert_eq!(summary.file_type, FileType::Row);
}

#[test]
fn test_written_config_reproduces_run() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("run.toml");
    let config = FormatConfig {
        file_type: FileType::Fix,
        rows: 120,
        ops: 300,
        bit_width: 5,
        seed: Some(77),
        ..Default::default()
    };
    config.write_to_file(&path).unwrap();

    let reloaded = FormatConfig::from_file(&path).unwrap();
    assert_eq!(reloaded, config);
    assert_eq!(run_clean(config), run_clean(reloaded));
}

#[test]
fn test_invalid_config_file_names_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "file_type = \"var\"\nreverse = true\n").unwrap();

    let err = FormatConfig::from_file(&path).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains("bad.toml"));
}

#[test]
fn test_missing_config_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = FormatConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

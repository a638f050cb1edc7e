//! Persistence round-trip and edge case tests.

use std::path::PathBuf;
use tempfile::TempDir;

use crate::config::Config;
use crate::error::StoreError;
use crate::persistence::{ensure_dir, load_json, load_json_or_default, save_json};

// ============================================================================
// JSON Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_save_and_load_json_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("config.json");

    let mut config = Config::default();
    config.tariff.customer_charge = 11.25;

    save_json(&file_path, &config).await.unwrap();
    let loaded: Config = load_json(&file_path).await.unwrap();

    assert_eq!(loaded, config);
}

#[tokio::test]
async fn test_save_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let nested_path = temp_dir.path().join("deeply").join("nested").join("test.json");

    let data = serde_json::json!({"key": "value"});

    save_json(&nested_path, &data).await.unwrap();
    assert!(nested_path.exists());
}

#[tokio::test]
async fn test_save_leaves_no_temp_file() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("config.json");

    save_json(&file_path, &Config::default()).await.unwrap();

    assert!(file_path.exists());
    assert!(!file_path.with_extension("json.tmp").exists());
}

#[tokio::test]
async fn test_save_overwrites_existing_file() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("config.json");

    let mut config = Config::default();
    save_json(&file_path, &config).await.unwrap();

    config.general.refresh_interval_secs = 120;
    save_json(&file_path, &config).await.unwrap();

    let loaded: Config = load_json(&file_path).await.unwrap();
    assert_eq!(loaded.general.refresh_interval_secs, 120);
}

#[cfg(unix)]
#[tokio::test]
async fn test_saved_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("config.json");

    save_json(&file_path, &Config::default()).await.unwrap();

    let mode = std::fs::metadata(&file_path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600);
}

#[tokio::test]
async fn test_load_nonexistent_file() {
    let file_path = PathBuf::from("/nonexistent/path/config.json");

    let result: Result<Config, _> = load_json(&file_path).await;
    assert!(matches!(result, Err(StoreError::Io(_))));
}

#[tokio::test]
async fn test_load_corrupt_file() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("config.json");
    tokio::fs::write(&file_path, "{ not json").await.unwrap();

    let result: Result<Config, _> = load_json(&file_path).await;
    assert!(matches!(result, Err(StoreError::Serialization(_))));

    let fallback: Config = load_json_or_default(&file_path).await;
    assert_eq!(fallback, Config::default());
}

#[tokio::test]
async fn test_ensure_dir_creates_directory() {
    let temp_dir = TempDir::new().unwrap();
    let new_dir = temp_dir.path().join("new_directory");

    assert!(!new_dir.exists());
    ensure_dir(&new_dir).await.unwrap();
    assert!(new_dir.is_dir());
}

#[tokio::test]
async fn test_ensure_dir_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let dir_path = temp_dir.path().join("test_dir");

    ensure_dir(&dir_path).await.unwrap();
    ensure_dir(&dir_path).await.unwrap();

    assert!(dir_path.exists());
}

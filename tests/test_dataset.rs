//! Dataset file cache tests. Everything runs offline.

use std::collections::HashMap;
use std::fs;
use std::time::Duration;

use covid_insights::{DatasetStore, InsightsError};

fn store(cache_dir: &std::path::Path, sources: &[(&str, &str)]) -> DatasetStore {
    let sources: HashMap<String, String> = sources
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    DatasetStore::new(cache_dir.to_path_buf(), sources, true, Duration::from_secs(5)).unwrap()
}

#[test]
fn local_path_is_used_as_is() {
    let tmp = tempfile::tempdir().unwrap();
    let file = tmp.path().join("covid.csv");
    fs::write(&file, "DATE,CASES\n2020-03-01,1\n").unwrap();

    let mut store = store(&tmp.path().join("cache"), &[("covid", file.to_str().unwrap())]);
    assert_eq!(store.ensure_file("covid").unwrap(), file);
}

#[test]
fn missing_local_file_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let missing = tmp.path().join("nope.csv");
    let mut store = store(&tmp.path().join("cache"), &[("covid", missing.to_str().unwrap())]);
    assert!(matches!(store.ensure_file("covid"), Err(InsightsError::NotFound(_))));
}

#[test]
fn unconfigured_view_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let mut store = store(tmp.path(), &[]);
    assert!(matches!(store.ensure_file("mobility"), Err(InsightsError::NotFound(_))));
}

#[test]
fn offline_remote_uses_cached_copy_only() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = tmp.path().join("cache");
    let mut store = store(&cache, &[("mobility", "https://example.invalid/data/mobility.csv.gz")]);

    let err = store.ensure_file("mobility").unwrap_err();
    assert!(matches!(err, InsightsError::NotFound(ref msg) if msg.contains("offline")));

    let cached = cache.join("mobility.csv");
    fs::write(&cached, "a,b\n1,2\n").unwrap();
    assert_eq!(store.ensure_file("mobility").unwrap(), cached);
}

#[test]
fn clear_wipes_cached_files_and_keeps_the_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = tmp.path().join("cache");
    let mut store = store(&cache, &[("cases", "https://example.invalid/cases.parquet")]);

    let cached = cache.join("cases.parquet");
    fs::write(&cached, b"stub").unwrap();
    assert_eq!(store.ensure_file("cases").unwrap(), cached);

    store.clear().unwrap();
    assert!(cache.is_dir());
    assert!(!cached.exists());
    assert!(store.ensure_file("cases").is_err());
}

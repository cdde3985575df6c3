use chrono::{Duration as ChronoDuration, Utc};
use dcleaner::cache::{CacheOptions, SizeCache, SizeValue};
use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn test_cache_persists_across_instances() {
    let dir = tempdir().unwrap();
    let options = CacheOptions::new(dir.path());
    let key = dir.path().join("app").to_string_lossy().into_owned();

    let cache = SizeCache::new(options.clone());
    cache.set(&key, SizeValue::from_bytes(5_000_000)).unwrap();

    let reopened = SizeCache::open(options);
    let value = reopened.get(&key).unwrap().unwrap();
    assert_eq!(value.size, 5_000_000);
    assert!((value.size_in_mb - 5.0).abs() < 1e-9);
}

#[test]
fn test_cache_file_is_pretty_json() {
    let dir = tempdir().unwrap();
    let cache = SizeCache::new(CacheOptions::new(dir.path()));
    let key = dir.path().join("app").to_string_lossy().into_owned();
    cache.set(&key, SizeValue::from_bytes(1_500_000)).unwrap();

    let path = cache.cache_file_path();
    assert_eq!(path, dir.path().join(".data/cache.json"));

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("{\n  \""));
    assert!(content.contains("\"saved\""));
    assert!(content.contains("\"sizeInMB\": 1.5"));

    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(json[key.as_str()]["value"]["size"], 1_500_000);
}

#[test]
fn test_cache_corrupt_file_starts_cold_and_recovers() {
    let dir = tempdir().unwrap();
    let options = CacheOptions::new(dir.path());
    let path = options.cache_file_path();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "{ not json").unwrap();

    let cache = SizeCache::open(options.clone());
    assert!(cache.is_empty());

    cache.set("pkg", SizeValue::from_bytes(10)).unwrap();
    let reopened = SizeCache::open(options);
    assert_eq!(reopened.len(), 1);
    assert!(reopened.has("pkg").unwrap());
}

#[test]
fn test_cache_empty_file_is_empty_table() {
    let dir = tempdir().unwrap();
    let options = CacheOptions::new(dir.path());
    let path = options.cache_file_path();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "").unwrap();

    assert!(SizeCache::open(options).is_empty());
}

#[test]
fn test_cache_logical_and_absolute_keys_agree() {
    let dir = tempdir().unwrap();
    let cache = SizeCache::new(CacheOptions::new(dir.path()));
    cache.set("lodash", SizeValue::from_bytes(42)).unwrap();

    let absolute = dir.path().join("node_modules/lodash");
    assert_eq!(
        cache.get(&absolute.to_string_lossy()).unwrap().map(|v| v.size),
        Some(42)
    );
    assert!(cache.remove(&absolute.to_string_lossy()).unwrap().is_some());
    assert!(!cache.has("lodash").unwrap());
}

#[test]
fn test_cache_invalid_keys_rejected() {
    let dir = tempdir().unwrap();
    let cache = SizeCache::new(CacheOptions::new(dir.path()));

    assert!(cache.get("").is_err());
    assert!(cache.set("   ", SizeValue::from_bytes(1)).is_err());
    assert!(cache.has("a\0b").is_err());
}

#[test]
fn test_cache_expiry_on_reload() {
    let dir = tempdir().unwrap();
    let options = CacheOptions::new(dir.path()).with_max_age(Duration::from_secs(60));
    let cache = SizeCache::new(options.clone());
    let now = Utc::now();

    cache
        .set_at("old", SizeValue::from_bytes(1), now - ChronoDuration::seconds(120))
        .unwrap();
    cache
        .set_at("new", SizeValue::from_bytes(2), now - ChronoDuration::seconds(10))
        .unwrap();
    cache.save().unwrap();

    let reopened = SizeCache::open(options);
    // Stale entries are invisible before the sweep and gone after it
    assert!(reopened.get("old").unwrap().is_none());
    assert!(reopened.has("old").unwrap());
    assert_eq!(reopened.cleanup_expired_entries(), 1);
    assert!(!reopened.has("old").unwrap());
    assert_eq!(reopened.get("new").unwrap().map(|v| v.size), Some(2));
}

#[test]
fn test_cache_expiry_boundary_is_strict() {
    let dir = tempdir().unwrap();
    let options = CacheOptions::new(dir.path()).with_max_age(Duration::from_secs(300));
    let cache = SizeCache::new(options);
    let saved = Utc::now();
    cache.set_at("pkg", SizeValue::from_bytes(1), saved).unwrap();

    let just_before = saved + ChronoDuration::seconds(299);
    let at_limit = saved + ChronoDuration::seconds(300);
    assert!(cache.get_at("pkg", just_before).unwrap().is_some());
    assert!(cache.get_at("pkg", at_limit).unwrap().is_none());
    assert_eq!(cache.cleanup_expired_entries_at(at_limit), 1);
}

#[test]
fn test_cache_concurrent_sets_all_survive() {
    let dir = tempdir().unwrap();
    let options = CacheOptions::new(dir.path());
    let cache = Arc::new(SizeCache::new(options.clone()));

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let cache = Arc::clone(&cache);
            let key = dir.path().join(format!("dir_{i}")).to_string_lossy().into_owned();
            thread::spawn(move || {
                cache.set(&key, SizeValue::from_bytes(1000 + i)).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.len(), 20);
    let reopened = SizeCache::open(options);
    assert_eq!(reopened.len(), 20);
}

#[test]
fn test_cache_load_switches_context() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    let mut cache = SizeCache::new(CacheOptions::new(first.path()));
    cache.set("pkg", SizeValue::from_bytes(7)).unwrap();

    cache.load(CacheOptions::new(second.path()));

    assert!(cache.is_empty());
    assert_eq!(cache.cache_file_path(), second.path().join(".data/cache.json"));
}

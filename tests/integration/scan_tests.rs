use dcleaner::cache::{CacheOptions, SizeCache, SizeValue};
use dcleaner::scanner::{get_directories, size_key, target_files, Choices, ScanError, Scanner};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_file(path: &Path, len: usize) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, vec![b'0'; len]).unwrap();
}

#[test]
fn test_scan_end_to_end_sizes() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a/node_modules/big.bin"), 5_000_000);
    fs::create_dir_all(dir.path().join("b/node_modules")).unwrap();
    let cache = SizeCache::new(CacheOptions::new(dir.path()));

    let choices = Scanner::new(&cache).get_choices(dir.path()).unwrap();

    assert_eq!(choices.names(), vec!["a".to_string(), "b".to_string()]);
    assert!((choices.candidates[0].size_in_mb - 5.0).abs() < 1e-9);
    assert_eq!(choices.candidates[1].size, 0);
    // Only the non-zero measurement is cached
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_scan_nested_targets_attributed_to_top_level() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("mono/packages/ui/node_modules/a.js"), 100);
    write_file(&dir.path().join("mono/packages/api/node_modules/b.js"), 50);
    write_file(&dir.path().join("mono/node_modules/c.js"), 25);
    write_file(&dir.path().join("mono/src/index.js"), 999);
    let cache = SizeCache::new(CacheOptions::new(dir.path()));

    let choices = Scanner::new(&cache).get_choices(dir.path()).unwrap();

    assert_eq!(choices.names(), vec!["mono".to_string()]);
    assert_eq!(choices.candidates[0].size, 175);
}

#[test]
fn test_scan_target_in_root_is_not_a_candidate() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("node_modules/pkg/index.js"), 10);
    write_file(&dir.path().join("app/node_modules/pkg/index.js"), 10);

    let names = get_directories(dir.path(), "node_modules").unwrap();

    assert_eq!(names, vec!["app".to_string()]);
}

#[test]
fn test_scan_exact_segment_match_only() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a/node_modules_backup/x.js"), 10);
    write_file(&dir.path().join("b/my-node_modules/x.js"), 10);

    assert!(get_directories(dir.path(), "node_modules").unwrap().is_empty());
}

#[test]
fn test_scan_hidden_directories_included() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join(".hidden/node_modules/x.js"), 10);

    assert_eq!(
        get_directories(dir.path(), "node_modules").unwrap(),
        vec![".hidden".to_string()]
    );
}

#[test]
fn test_scan_custom_target() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("crate/target/debug/bin"), 30);
    write_file(&dir.path().join("crate/src/main.rs"), 5);
    let cache = SizeCache::new(CacheOptions::new(dir.path()).with_target_dir("target"));

    let choices = Scanner::new(&cache).get_choices(dir.path()).unwrap();

    assert_eq!(choices.names(), vec!["crate".to_string()]);
    assert_eq!(choices.candidates[0].size, 30);
}

#[test]
fn test_scan_root_errors() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("plain.txt");
    write_file(&file, 1);
    let cache = SizeCache::new(CacheOptions::new(dir.path()));
    let scanner = Scanner::new(&cache);

    assert!(matches!(
        scanner.get_choices(&dir.path().join("missing")),
        Err(ScanError::NotFound(_))
    ));
    assert!(matches!(
        scanner.get_choices(&file),
        Err(ScanError::NotADirectory(_))
    ));
}

#[test]
fn test_scan_uses_fresh_cache_value() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a/node_modules/x.js"), 10);
    let cache = SizeCache::new(CacheOptions::new(dir.path()));
    let key = size_key(&dir.path().join("a"), "node_modules");
    cache.set(&key, SizeValue::from_bytes(123_456)).unwrap();

    let scanner = Scanner::new(&cache);
    let choices = scanner.get_choices(dir.path()).unwrap();

    assert_eq!(choices.candidates[0].size, 123_456);
    assert_eq!(scanner.sizer().walk_count(), 0);
}

#[test]
fn test_scan_sizes_are_kept_per_target_name() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a/node_modules/x.js"), 5_000_000);
    write_file(&dir.path().join("a/target/y.o"), 10);

    let node_cache = SizeCache::open(CacheOptions::new(dir.path()));
    let node = Scanner::new(&node_cache).get_choices(dir.path()).unwrap();
    assert_eq!(node.candidates[0].size, 5_000_000);

    let target_options = CacheOptions::new(dir.path()).with_target_dir("target");
    let target_cache = SizeCache::open(target_options);
    let scanner = Scanner::new(&target_cache);
    let target = scanner.get_choices(dir.path()).unwrap();

    assert_eq!(target.names(), vec!["a"]);
    assert_eq!(target.candidates[0].size, 10);
    assert_eq!(scanner.sizer().walk_count(), 1);

    let reopened = SizeCache::open(CacheOptions::new(dir.path()));
    let node_key = size_key(&dir.path().join("a"), "node_modules");
    let node_size = reopened.get(&node_key).unwrap().map(|v| v.size);
    assert_eq!(node_size, Some(5_000_000));
}

#[test]
fn test_scan_twenty_candidates_all_cached() {
    let dir = tempdir().unwrap();
    for i in 0..20 {
        write_file(&dir.path().join(format!("p{i:02}/node_modules/x.js")), 100 + i);
    }
    let options = CacheOptions::new(dir.path());

    let cache = SizeCache::open(options.clone());
    let choices = Scanner::new(&cache)
        .with_io_threads(8)
        .get_choices(dir.path())
        .unwrap();

    assert_eq!(choices.candidates.len(), 20);
    assert!(choices.failures.is_empty());
    assert_eq!(cache.len(), 20);
    let reopened = SizeCache::open(options);
    assert_eq!(reopened.len(), 20);
    for i in 0..20 {
        let key = size_key(&dir.path().join(format!("p{i:02}")), "node_modules");
        let size = reopened.get(&key).unwrap().map(|v| v.size);
        assert_eq!(size, Some(100 + i as u64));
    }
}

#[test]
fn test_get_choice_names_lists_candidates() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("big/node_modules/x.js"), 500);
    write_file(&dir.path().join("small/node_modules/y.js"), 5);
    fs::create_dir_all(dir.path().join("plain/src")).unwrap();
    let cache = SizeCache::new(CacheOptions::new(dir.path()));

    let mut names = Scanner::new(&cache).get_choice_names(dir.path()).unwrap();
    names.sort();

    assert_eq!(names, vec!["big", "small"]);
    assert!(matches!(
        Scanner::new(&cache).get_choice_names(&dir.path().join("missing")),
        Err(ScanError::NotFound(_))
    ));
}

#[test]
fn test_target_files_lists_only_target_contents() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("node_modules/a.js"), 3);
    write_file(&dir.path().join("lib/node_modules/deep/b.js"), 4);
    write_file(&dir.path().join("src/c.js"), 100);

    let mut files = target_files(dir.path(), "node_modules").unwrap();
    files.sort_by(|a, b| a.path.cmp(&b.path));

    assert_eq!(files.len(), 2);
    assert_eq!(files.iter().map(|f| f.size).sum::<u64>(), 7);
}

#[test]
fn test_scan_io_threads_do_not_change_results() {
    let dir = tempdir().unwrap();
    for i in 0..12 {
        write_file(&dir.path().join(format!("p{i:02}/node_modules/x.js")), 10 + i);
    }

    let single = SizeCache::new(CacheOptions::new(dir.path()).with_data_dir("single"));
    let pooled = SizeCache::new(CacheOptions::new(dir.path()).with_data_dir("pooled"));
    let a = Scanner::new(&single).with_io_threads(1).get_choices(dir.path()).unwrap();
    let b = Scanner::new(&pooled).with_io_threads(8).get_choices(dir.path()).unwrap();

    assert_eq!(a.names(), b.names());
    assert_eq!(a.names().len(), 12);
    let sizes = |c: &Choices| c.candidates.iter().map(|x| x.size).collect::<Vec<_>>();
    assert_eq!(sizes(&a), sizes(&b));
}

#[cfg(unix)]
#[test]
fn test_scan_symlinks_not_followed() {
    let dir = tempdir().unwrap();
    let outside = tempdir().unwrap();
    write_file(&outside.path().join("node_modules/huge.bin"), 1000);
    write_file(&dir.path().join("app/node_modules/small.js"), 10);
    std::os::unix::fs::symlink(outside.path(), dir.path().join("app/link")).unwrap();

    let cache = SizeCache::new(CacheOptions::new(dir.path()));
    let choices = Scanner::new(&cache).get_choices(dir.path()).unwrap();

    assert_eq!(choices.names(), vec!["app".to_string()]);
    assert_eq!(choices.candidates[0].size, 10);
}

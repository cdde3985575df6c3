use dcleaner::actions::{delete_dir, find_target_dirs};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_file(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"module.exports = {}").unwrap();
}

#[test]
fn test_delete_removes_every_depth_and_keeps_sources() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("mono/node_modules/a/index.js"));
    write_file(&dir.path().join("mono/packages/ui/node_modules/b/index.js"));
    write_file(&dir.path().join("mono/packages/ui/src/App.js"));
    write_file(&dir.path().join("mono/package.json"));

    let outcome = delete_dir(dir.path(), "mono", "node_modules");

    assert!(outcome.all_succeeded());
    assert_eq!(outcome.removed.len(), 2);
    let (remaining, errors) = find_target_dirs(&dir.path().join("mono"), "node_modules");
    assert!(remaining.is_empty());
    assert!(errors.is_empty());
    assert!(dir.path().join("mono/packages/ui/src/App.js").exists());
    assert!(dir.path().join("mono/package.json").exists());
}

#[test]
fn test_delete_only_touches_named_candidate() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a/node_modules/x.js"));
    write_file(&dir.path().join("b/node_modules/y.js"));

    delete_dir(dir.path(), "a", "node_modules");

    assert!(!dir.path().join("a/node_modules").exists());
    assert!(dir.path().join("b/node_modules/y.js").exists());
}

#[test]
fn test_delete_custom_target_exact_match() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("crate/target/debug/app"));
    write_file(&dir.path().join("crate/targets.txt"));
    write_file(&dir.path().join("crate/src/target_utils.rs"));

    let outcome = delete_dir(dir.path(), "crate", "target");

    assert_eq!(outcome.removed, vec![dir.path().join("crate/target")]);
    assert!(dir.path().join("crate/targets.txt").exists());
    assert!(dir.path().join("crate/src/target_utils.rs").exists());
}

#[cfg(unix)]
#[test]
fn test_delete_does_not_follow_symlinks() {
    let dir = tempdir().unwrap();
    let outside = tempdir().unwrap();
    write_file(&outside.path().join("node_modules/keep.js"));
    write_file(&dir.path().join("app/node_modules/x.js"));
    std::os::unix::fs::symlink(outside.path(), dir.path().join("app/linked")).unwrap();

    delete_dir(dir.path(), "app", "node_modules");

    assert!(!dir.path().join("app/node_modules").exists());
    assert!(outside.path().join("node_modules/keep.js").exists());
}

#[cfg(unix)]
#[test]
fn test_delete_failure_is_isolated() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    write_file(&dir.path().join("app/locked/node_modules/x.js"));
    write_file(&dir.path().join("app/open/node_modules/y.js"));
    let locked = dir.path().join("app/locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

    let outcome = delete_dir(dir.path(), "app", "node_modules");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    // Root ignores directory permissions, so only check isolation when it applies
    if !outcome.all_succeeded() {
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(
            outcome.failures[0].path(),
            dir.path().join("app/locked/node_modules")
        );
    }
    assert!(!dir.path().join("app/open/node_modules").exists());
}

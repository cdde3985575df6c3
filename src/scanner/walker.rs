//! Directory traversal using jwalk for parallel reads.
//!
//! # Overview
//!
//! Two walks are provided:
//!
//! - [`get_directories`] finds every directory named after the target beneath
//!   a root and attributes it to the root's immediate child that contains it.
//! - [`target_files`] lists every regular file beneath a path whose relative
//!   path passes through a target directory.
//!
//! Symbolic links are never followed and hidden entries are included.
//!
//! # Example
//!
//! ```no_run
//! use dcleaner::scanner::get_directories;
//! use std::path::Path;
//!
//! let names = get_directories(Path::new("/home/user/projects"), "node_modules").unwrap();
//! println!("{} projects carry node_modules", names.len());
//! ```

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use jwalk::WalkDir;

use super::{ensure_readable_dir, has_target_segment, ScanError};

/// Directory name that is never reported as a candidate.
pub const EMPTY_PLACEHOLDER: &str = "empty";

/// A regular file found beneath a target directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFile {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

/// Configure jwalk with deterministic ordering.
///
/// With `prune` set, directories with that name are yielded but not entered.
fn walk_dir(root: &Path, prune: Option<OsString>) -> WalkDir {
    WalkDir::new(root)
        .follow_links(false)
        .skip_hidden(false)
        .process_read_dir(move |_depth, _path, _read_dir_state, children| {
            children.sort_by(|a, b| match (a, b) {
                (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                (Err(_), Err(_)) => std::cmp::Ordering::Equal,
            });

            if let Some(ref name) = prune {
                children.iter_mut().flatten().for_each(|entry| {
                    if entry.file_type().is_dir() && entry.file_name() == name.as_os_str() {
                        entry.read_children_path = None;
                    }
                });
            }
        })
}

/// Find the top-level directories under `root` that contain a directory named
/// `target` at any depth.
///
/// Names are returned once each, in walk order. A target directory sitting
/// directly in `root` has no containing candidate and is skipped, as is the
/// [`EMPTY_PLACEHOLDER`] name. Unreadable subdirectories are logged and
/// skipped.
///
/// # Errors
///
/// Fails only when `root` itself is missing, unreadable or not a directory.
pub fn get_directories(root: &Path, target: &str) -> Result<Vec<String>, ScanError> {
    ensure_readable_dir(root)?;

    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for entry in walk_dir(root, Some(OsString::from(target))) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("{}", ScanError::from_walk(root, e));
                continue;
            }
        };

        if entry.depth < 2 || !entry.file_type().is_dir() || entry.file_name() != target {
            continue;
        }

        let path = entry.path();
        let Some(first) = path
            .strip_prefix(root)
            .ok()
            .and_then(|relative| relative.components().next())
        else {
            continue;
        };
        let Component::Normal(first) = first else {
            continue;
        };

        let name = first.to_string_lossy().into_owned();
        if name == EMPTY_PLACEHOLDER {
            log::trace!("Skipping placeholder directory: {}", path.display());
            continue;
        }
        if seen.insert(name.clone()) {
            log::trace!("Found {} under {}", target, name);
            names.push(name);
        }
    }

    log::debug!(
        "Found {} director{} containing {} in {}",
        names.len(),
        if names.len() == 1 { "y" } else { "ies" },
        target,
        root.display()
    );
    Ok(names)
}

/// List the regular files beneath `path` whose path relative to `path`
/// contains a `target` segment.
///
/// # Errors
///
/// Fails if `path` cannot be read, or if any matching file cannot be
/// stat'ed. A failure anywhere fails the whole listing.
pub fn target_files(path: &Path, target: &str) -> Result<Vec<TargetFile>, ScanError> {
    ensure_readable_dir(path)?;

    let mut files = Vec::new();
    for entry in walk_dir(path, None) {
        let entry = entry.map_err(|e| ScanError::from_walk(path, e))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let file_path = entry.path();
        let matches = file_path
            .strip_prefix(path)
            .is_ok_and(|relative| has_target_segment(relative, target));
        if !matches {
            continue;
        }

        let metadata = std::fs::symlink_metadata(&file_path)
            .map_err(|e| ScanError::from_io(&file_path, e))?;
        files.push(TargetFile {
            path: file_path,
            size: metadata.len(),
        });
    }

    Ok(files)
}

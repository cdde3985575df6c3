//! Removal of target directories.
//!
//! # Overview
//!
//! [`delete_dir`] removes `<working_dir>/<directory>/<target>` and then every
//! other directory named `<target>` found beneath `<working_dir>/<directory>`.
//! Each matched directory is removed once: the walk does not descend into a
//! match, so targets nested inside a removed target are not revisited.
//!
//! Removal is idempotent. A path that is already gone is not an error, and a
//! failure on one directory is logged and recorded while the remaining
//! matches are still processed. Subdirectories that cannot be listed are
//! recorded as failures too, since targets inside them were not reached.
//!
//! # Example
//!
//! ```no_run
//! use dcleaner::actions::delete::delete_dir;
//! use std::path::Path;
//!
//! let outcome = delete_dir(Path::new("/home/user/projects"), "webapp", "node_modules");
//! println!("removed {} directories", outcome.removed.len());
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// Permission denied when attempting to delete.
    #[error("permission denied: {0} - try running with elevated privileges")]
    PermissionDenied(PathBuf),

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path that could not be removed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied(p) | Self::Io { path: p, .. } => p,
        }
    }

    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// What happened while cleaning one directory.
#[derive(Debug, Default)]
pub struct DeleteOutcome {
    /// Target directories that were removed.
    pub removed: Vec<PathBuf>,
    /// Target directories that could not be removed.
    pub failures: Vec<DeleteError>,
}

impl DeleteOutcome {
    /// Whether every matched directory was removed.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Remove a directory tree. Returns `false` if it did not exist.
///
/// # Errors
///
/// Returns a [`DeleteError`] if the tree exists but could not be removed.
pub fn remove_target_dir(path: &Path) -> Result<bool, DeleteError> {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            log::info!("Removed {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::trace!("Already absent: {}", path.display());
            Ok(false)
        }
        Err(e) => Err(DeleteError::from_io(path, e)),
    }
}

/// Find every directory named `target` beneath `base`, without entering the
/// matches themselves.
///
/// Entries that cannot be read are skipped and returned as errors alongside
/// the matches. A missing `base` yields neither.
#[must_use]
pub fn find_target_dirs(base: &Path, target: &str) -> (Vec<PathBuf>, Vec<DeleteError>) {
    let mut found = Vec::new();
    let mut errors = Vec::new();
    let mut walker = WalkDir::new(base)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_dir() && entry.file_name() == target {
                    found.push(entry.into_path());
                    walker.skip_current_dir();
                }
            }
            Err(e) => {
                let kind = e.io_error().map_or(io::ErrorKind::Other, io::Error::kind);
                if e.depth() == 0 && kind == io::ErrorKind::NotFound {
                    log::debug!("Nothing to clean, {} does not exist", base.display());
                    continue;
                }
                log::warn!("Error walking {}: {}", base.display(), e);
                let path = e.path().unwrap_or(base).to_path_buf();
                errors.push(DeleteError::from_io(&path, io::Error::new(kind, e.to_string())));
            }
        }
    }

    (found, errors)
}

/// Remove the `target` directories belonging to `directory`.
///
/// `directory` is resolved against `working_dir`; an absolute `directory`
/// is used as is. The immediate `<directory>/<target>` is removed first,
/// then every deeper match.
#[must_use]
pub fn delete_dir(working_dir: &Path, directory: &str, target: &str) -> DeleteOutcome {
    let base = working_dir.join(directory);
    let primary = base.join(target);
    let mut outcome = DeleteOutcome::default();

    let mut remove = |path: PathBuf| match remove_target_dir(&path) {
        Ok(true) => outcome.removed.push(path),
        Ok(false) => {}
        Err(e) => {
            log::error!("Error removing directory {}: {}", path.display(), e);
            outcome.failures.push(e);
        }
    };

    remove(primary.clone());
    let (nested, walk_errors) = find_target_dirs(&base, target);
    for path in nested {
        if path != primary {
            remove(path);
        }
    }
    outcome.failures.extend(walk_errors);

    outcome
}

/// Result of cleaning one candidate.
#[derive(Debug, Clone)]
pub struct DeleteResult {
    /// Candidate name.
    pub name: String,
    /// Bytes the candidate's target directories held.
    pub size: u64,
    /// Directories that were removed.
    pub removed: Vec<PathBuf>,
}

impl DeleteResult {
    /// Create a new delete result.
    #[must_use]
    pub fn new(name: impl Into<String>, size: u64, removed: Vec<PathBuf>) -> Self {
        Self {
            name: name.into(),
            size,
            removed,
        }
    }
}

/// Results of cleaning a selection of candidates.
#[derive(Debug, Clone, Default)]
pub struct BatchDeleteResult {
    /// Candidates cleaned completely.
    pub successes: Vec<DeleteResult>,
    /// Candidates with at least one failed removal, with the error message.
    pub failures: Vec<(String, String)>,
    /// Total bytes freed by the successes.
    pub bytes_freed: u64,
}

impl BatchDeleteResult {
    /// Number of candidates cleaned completely.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Number of candidates with failures.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Total number of candidates attempted.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    /// Check if all candidates were cleaned.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        let freed = bytesize::ByteSize::b(self.bytes_freed);
        if self.all_succeeded() {
            format!(
                "Cleaned {} director{}, freed {}",
                self.success_count(),
                if self.success_count() == 1 { "y" } else { "ies" },
                freed
            )
        } else {
            format!(
                "Cleaned {} director{}, {} failed, freed {}",
                self.success_count(),
                if self.success_count() == 1 { "y" } else { "ies" },
                self.failure_count(),
                freed
            )
        }
    }
}

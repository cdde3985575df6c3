//! Scanner module for target directory discovery and sizing.
//!
//! This module provides functionality for:
//! - Parallel directory walking using jwalk
//! - Attributing nested target directories to their top-level candidate
//! - Cache-assisted size computation
//! - Building the candidate list with per-candidate failure isolation
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and target matching
//! - [`sizer`]: Recursive size computation through the [`SizeCache`](crate::cache::SizeCache)
//! - [`candidate`]: The [`Candidate`] model and the [`Scanner`] that builds it
//!
//! # Example
//!
//! ```no_run
//! use dcleaner::cache::{CacheOptions, SizeCache};
//! use dcleaner::scanner::Scanner;
//!
//! let cache = SizeCache::open(CacheOptions::new("/home/user/projects"));
//! let scanner = Scanner::new(&cache);
//! let choices = scanner.get_choices(&cache.options().working_dir).unwrap();
//! for candidate in &choices.candidates {
//!     println!("{}: {}", candidate.name, candidate.hint);
//! }
//! ```

pub mod candidate;
pub mod sizer;
pub mod walker;

use std::io;
use std::path::{Path, PathBuf};

pub use candidate::{Candidate, Choices, Scanner, DEFAULT_IO_THREADS};
pub use sizer::{size_key, Sizer};
pub use walker::{get_directories, target_files, TargetFile, EMPTY_PLACEHOLDER};

/// Errors that can occur during scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The directory walker failed.
    #[error("Walk error for {path}: {message}")]
    Walk {
        /// Path where the error occurred
        path: PathBuf,
        /// Description from the walker
        message: String,
    },

    /// The size cache rejected a key.
    #[error(transparent)]
    Cache(#[from] crate::cache::CacheError),
}

impl ScanError {
    /// Classify an I/O error for `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    pub(crate) fn from_walk(root: &Path, error: jwalk::Error) -> Self {
        let path = error
            .path()
            .map_or_else(|| root.to_path_buf(), Path::to_path_buf);
        match error.io_error().map(io::Error::kind) {
            Some(io::ErrorKind::PermissionDenied) => Self::PermissionDenied(path),
            Some(io::ErrorKind::NotFound) => Self::NotFound(path),
            _ => Self::Walk {
                path,
                message: error.to_string(),
            },
        }
    }
}

/// Check that `path` is an existing, readable directory.
///
/// # Errors
///
/// Returns `NotFound`, `PermissionDenied`, `NotADirectory` or `Io`.
pub fn ensure_readable_dir(path: &Path) -> Result<(), ScanError> {
    let metadata = std::fs::metadata(path).map_err(|e| ScanError::from_io(path, e))?;
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory(path.to_path_buf()));
    }
    std::fs::read_dir(path).map_err(|e| ScanError::from_io(path, e))?;
    Ok(())
}

/// Whether any component of `relative` equals `target`.
pub(crate) fn has_target_segment(relative: &Path, target: &str) -> bool {
    relative
        .components()
        .any(|component| component.as_os_str() == target)
}

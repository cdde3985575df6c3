//! Cache-assisted recursive size computation.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::cache::{SizeCache, SizeValue};

use super::walker::target_files;
use super::ScanError;

/// Cache key for the measurement of `path` against `target`.
///
/// The key names the target directory inside `path`, so measurements taken
/// for different target names never share an entry.
#[must_use]
pub fn size_key(path: &Path, target: &str) -> String {
    path.join(target).to_string_lossy().into_owned()
}

/// Computes how many bytes of target directories sit beneath a path.
///
/// Results are read through and written through the [`SizeCache`], keyed by
/// [`size_key`].
#[derive(Debug)]
pub struct Sizer<'a> {
    cache: &'a SizeCache,
    target: String,
    /// Number of filesystem walks performed (cache misses).
    walks: AtomicUsize,
}

impl<'a> Sizer<'a> {
    /// Create a sizer for the cache's target directory name.
    #[must_use]
    pub fn new(cache: &'a SizeCache) -> Self {
        Self {
            cache,
            target: cache.options().target_dir.clone(),
            walks: AtomicUsize::new(0),
        }
    }

    /// Total size of the target directories beneath `path`.
    ///
    /// An unexpired cached value is returned without touching the
    /// filesystem. Otherwise every matching file is stat'ed and the sizes are
    /// summed as integers. Non-zero totals are stored in the cache and
    /// persisted; a zero total is returned without caching so a directory
    /// populated later is measured again.
    ///
    /// # Errors
    ///
    /// Returns a [`ScanError`] if the path cannot be walked, a matching file
    /// cannot be stat'ed, or the path cannot be used as a cache key.
    pub fn recursive_target_dir_size(&self, path: &Path) -> Result<SizeValue, ScanError> {
        let key = size_key(path, &self.target);
        if let Some(cached) = self.cache.get(&key)? {
            log::trace!("Cache hit for {}: {} bytes", path.display(), cached.size);
            return Ok(cached);
        }

        self.walks.fetch_add(1, Ordering::Relaxed);
        let files = target_files(path, &self.target)?;
        if files.is_empty() {
            log::trace!("No {} files under {}", self.target, path.display());
            return Ok(SizeValue::ZERO);
        }

        let size = files
            .iter()
            .fold(0u64, |total, file| total.saturating_add(file.size));
        let value = SizeValue::from_bytes(size);
        log::debug!(
            "Measured {}: {} bytes in {} files",
            path.display(),
            size,
            files.len()
        );

        self.cache.set(&key, value)?;
        Ok(value)
    }

    /// Number of filesystem walks performed so far.
    #[must_use]
    pub fn walk_count(&self) -> usize {
        self.walks.load(Ordering::Relaxed)
    }

    /// The cache this sizer reads and writes.
    #[must_use]
    pub fn cache(&self) -> &'a SizeCache {
        self.cache
    }
}

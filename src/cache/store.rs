//! JSON-backed size cache.
//!
//! The table maps a resolved absolute path to a [`CacheEntry`]. It is held in
//! memory behind a mutex so concurrent sizing workers can insert measurements,
//! and flushed to a single pretty-printed JSON file. Writes are serialized
//! through a dedicated lock, so at most one write to the backing file is in
//! flight at a time.
//!
//! # Key resolution
//!
//! Every operation resolves its key through
//! `working_dir / target_dir / key`. An absolute key resolves to itself, so
//! callers may pass either a logical name or a fully resolved path and reach
//! the same entry from `get`, `set`, `has` and `remove`.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::entry::{CacheEntry, SizeValue};

/// Default maximum age of a cache entry (5 minutes).
pub const DEFAULT_MAX_CACHE_AGE: Duration = Duration::from_secs(5 * 60);

/// Default name of the backing cache file.
pub const DEFAULT_CACHE_FILE: &str = "cache.json";

/// Default data directory, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = ".data";

/// Default name of the directory to search for and remove.
pub const DEFAULT_TARGET_DIR: &str = "node_modules";

/// Errors raised by the size cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The key was empty or not usable as a path segment.
    #[error("invalid cache key: {0:?}")]
    InvalidKey(String),

    /// The cache file could not be written.
    #[error("failed to persist cache to {path}: {source}")]
    Persist {
        /// Path of the cache file
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The cache table could not be serialized.
    #[error("failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The cache file exists but could not be read or parsed.
    #[error("failed to load cache from {path}: {message}")]
    Load {
        /// Path of the cache file
        path: PathBuf,
        /// What went wrong
        message: String,
    },
}

/// Convenience alias for cache results.
pub type CacheResult<T> = Result<T, CacheError>;

/// Context the cache operates in.
///
/// Threaded explicitly through construction instead of relying on the
/// process working directory.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheOptions {
    /// Root under which candidates are discovered.
    pub working_dir: PathBuf,
    /// Name of the directory being searched for.
    pub target_dir: String,
    /// Directory holding the cache file. Relative paths are resolved
    /// against `working_dir`.
    pub data_dir: PathBuf,
    /// File name of the cache inside `data_dir`.
    pub cache_file: String,
    /// Maximum age of a valid entry.
    pub max_age: Duration,
}

impl CacheOptions {
    /// Options for `working_dir` with every other field at its default.
    #[must_use]
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            target_dir: DEFAULT_TARGET_DIR.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            cache_file: DEFAULT_CACHE_FILE.to_string(),
            max_age: DEFAULT_MAX_CACHE_AGE,
        }
    }

    /// Set the target directory name.
    #[must_use]
    pub fn with_target_dir(mut self, target_dir: impl Into<String>) -> Self {
        self.target_dir = target_dir.into();
        self
    }

    /// Set the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Set the cache file name.
    #[must_use]
    pub fn with_cache_file(mut self, cache_file: impl Into<String>) -> Self {
        self.cache_file = cache_file.into();
        self
    }

    /// Set the maximum entry age.
    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Full path of the backing cache file.
    #[must_use]
    pub fn cache_file_path(&self) -> PathBuf {
        normalize_path(&self.working_dir.join(&self.data_dir).join(&self.cache_file))
    }
}

/// Persistent, time-bounded cache of directory sizes.
#[derive(Debug)]
pub struct SizeCache {
    options: CacheOptions,
    entries: Mutex<BTreeMap<String, CacheEntry>>,
    /// Held for the duration of a file write.
    write_lock: Mutex<()>,
}

impl SizeCache {
    /// Create an empty cache for the given context.
    ///
    /// The data directory is created if missing, provided the working
    /// directory exists; failure to do so is logged and surfaces later as a
    /// persist failure.
    #[must_use]
    pub fn new(options: CacheOptions) -> Self {
        let cache = Self {
            options,
            entries: Mutex::new(BTreeMap::new()),
            write_lock: Mutex::new(()),
        };
        cache.ensure_data_dir();
        cache
    }

    /// Create a cache and populate it from the backing file.
    #[must_use]
    pub fn open(options: CacheOptions) -> Self {
        let mut cache = Self::new(options.clone());
        cache.load(options);
        cache
    }

    /// The context this cache resolves keys in.
    #[must_use]
    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    /// Full path of the backing cache file.
    #[must_use]
    pub fn cache_file_path(&self) -> PathBuf {
        self.options.cache_file_path()
    }

    /// Resolve a logical key to the absolute path it is stored under.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidKey`] if the key is empty, blank or
    /// contains a NUL byte.
    pub fn resolve_key(&self, key: &str) -> CacheResult<String> {
        if key.trim().is_empty() || key.contains('\0') {
            return Err(CacheError::InvalidKey(key.to_string()));
        }
        let resolved = self
            .options
            .working_dir
            .join(&self.options.target_dir)
            .join(key);
        Ok(normalize_path(&resolved).to_string_lossy().into_owned())
    }

    /// Look up a fresh measurement for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidKey`] for an invalid key.
    pub fn get(&self, key: &str) -> CacheResult<Option<SizeValue>> {
        self.get_at(key, Utc::now())
    }

    /// Look up a measurement for `key` as it would be seen at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidKey`] for an invalid key.
    pub fn get_at(&self, key: &str, now: DateTime<Utc>) -> CacheResult<Option<SizeValue>> {
        let resolved = self.resolve_key(key)?;
        let entries = self.lock_entries();
        Ok(entries
            .get(&resolved)
            .filter(|entry| entry.is_fresh_at(now, self.options.max_age))
            .map(|entry| entry.value))
    }

    /// Store a measurement for `key`, stamped with the current time, and
    /// persist the table.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidKey`] for an invalid key. Persistence
    /// failures are logged, not returned.
    pub fn set(&self, key: &str, value: SizeValue) -> CacheResult<()> {
        self.set_at(key, value, Utc::now())?;
        self.persist();
        Ok(())
    }

    /// Store a measurement stamped with `saved`, without persisting.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidKey`] for an invalid key.
    pub fn set_at(&self, key: &str, value: SizeValue, saved: DateTime<Utc>) -> CacheResult<()> {
        let resolved = self.resolve_key(key)?;
        log::trace!("Cache set: {} = {} bytes", resolved, value.size);
        let entry = CacheEntry::new(resolved.clone(), value, saved);
        self.lock_entries().insert(resolved, entry);
        Ok(())
    }

    /// Remove the entry for `key`, returning it if present.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidKey`] for an invalid key.
    pub fn remove(&self, key: &str) -> CacheResult<Option<CacheEntry>> {
        let resolved = self.resolve_key(key)?;
        let removed = self.lock_entries().remove(&resolved);
        if removed.is_some() {
            log::debug!("Cache entry removed: {}", resolved);
        }
        Ok(removed)
    }

    /// Whether an entry exists for `key`, regardless of its age.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidKey`] for an invalid key.
    pub fn has(&self, key: &str) -> CacheResult<bool> {
        let resolved = self.resolve_key(key)?;
        Ok(self.lock_entries().contains_key(&resolved))
    }

    /// Drop every entry from memory. Does not persist.
    pub fn clear(&self) {
        self.lock_entries().clear();
    }

    /// Number of entries held, stale or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }

    /// A copy of the current table.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, CacheEntry> {
        self.lock_entries().clone()
    }

    /// Switch to a new context and reload the table from its backing file.
    ///
    /// The in-memory table is emptied first. A missing file leaves it empty;
    /// an unreadable or corrupt file is logged and also leaves it empty.
    pub fn load(&mut self, options: CacheOptions) {
        self.options = options;
        self.ensure_data_dir();
        let path = self.cache_file_path();

        let table = match read_table(&path) {
            Ok(Some(table)) => {
                log::debug!(
                    "Loaded {} cache entries from {}",
                    table.len(),
                    path.display()
                );
                table
            }
            Ok(None) => {
                log::debug!("No cache file at {}, starting cold", path.display());
                BTreeMap::new()
            }
            Err(e) => {
                log::warn!("Error loading cache, starting cold: {}", e);
                BTreeMap::new()
            }
        };

        *self.lock_entries() = table;
    }

    /// Write the whole table to the backing file.
    ///
    /// The file is written to a sibling temporary file and renamed into
    /// place. Concurrent callers are serialized.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Persist`] or [`CacheError::Serialize`] if the
    /// table could not be written.
    pub fn save(&self) -> CacheResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let json = {
            let entries = self.lock_entries();
            serde_json::to_string_pretty(&*entries)?
        };

        let path = self.cache_file_path();
        let persist_err = |source: io::Error| CacheError::Persist {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(persist_err)?;
        }
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(persist_err)?;
        fs::rename(&tmp_path, &path).map_err(persist_err)?;

        log::trace!("Cache saved to {}", path.display());
        Ok(())
    }

    /// Best-effort [`save`](Self::save): failures are logged and the
    /// in-memory table stays authoritative.
    pub fn persist(&self) {
        if let Err(e) = self.save() {
            log::error!("Error saving cache: {}", e);
        }
    }

    /// Drop every entry whose age has reached `max_age`. Returns how many
    /// entries were removed.
    pub fn cleanup_expired_entries(&self) -> usize {
        self.cleanup_expired_entries_at(Utc::now())
    }

    /// [`cleanup_expired_entries`](Self::cleanup_expired_entries) evaluated at `now`.
    pub fn cleanup_expired_entries_at(&self, now: DateTime<Utc>) -> usize {
        let max_age = self.options.max_age;
        let mut entries = self.lock_entries();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh_at(now, max_age));
        let removed = before - entries.len();
        if removed > 0 {
            log::debug!("Removed {} expired cache entries", removed);
        }
        removed
    }

    fn lock_entries(&self) -> MutexGuard<'_, BTreeMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_data_dir(&self) {
        if !self.options.working_dir.is_dir() {
            log::debug!(
                "Working directory {} does not exist, not creating the cache directory",
                self.options.working_dir.display()
            );
            return;
        }
        let path = self.cache_file_path();
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!(
                    "Failed to create cache directory {}: {}",
                    parent.display(),
                    e
                );
            }
        }
    }
}

/// Read a cache table. `Ok(None)` means there is no usable file yet.
fn read_table(path: &Path) -> CacheResult<Option<BTreeMap<String, CacheEntry>>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(CacheError::Load {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }
    };

    if content.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| CacheError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding component. Does not touch the filesystem.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

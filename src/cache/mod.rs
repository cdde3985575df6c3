//! Directory size caching for dcleaner.
//!
//! Computing the size of a dependency-cache directory means walking every
//! file beneath it, so measured sizes are persisted and reused across runs.
//!
//! # Architecture
//!
//! * [`entry`]: The data model stored in the cache and its freshness rule.
//! * [`store`]: The in-memory table, key resolution and JSON persistence.
//!
//! # Cache Invalidation
//!
//! Entries are time-bounded: a measurement is valid only while
//! `now - saved < max_age`. Stale entries are treated as absent by
//! [`SizeCache::get`] and are physically dropped by
//! [`SizeCache::cleanup_expired_entries`]. Deleting a directory removes its
//! entry explicitly.

pub mod entry;
pub mod store;

pub use entry::{CacheEntry, SizeValue, BYTES_PER_MB};
pub use store::{
    CacheError, CacheOptions, CacheResult, SizeCache, DEFAULT_CACHE_FILE, DEFAULT_DATA_DIR,
    DEFAULT_MAX_CACHE_AGE, DEFAULT_TARGET_DIR,
};

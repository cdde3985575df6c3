//! Cache entry definitions.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of bytes in one (decimal) megabyte, as reported in `sizeInMB`.
pub const BYTES_PER_MB: f64 = 1_000_000.0;

/// A size measurement of a directory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeValue {
    /// Total size in bytes.
    pub size: u64,
    /// Total size in megabytes (`size / 1_000_000`).
    #[serde(rename = "sizeInMB")]
    pub size_in_mb: f64,
}

impl SizeValue {
    /// A zero-byte measurement.
    pub const ZERO: Self = Self {
        size: 0,
        size_in_mb: 0.0,
    };

    /// Build a measurement from a byte count, deriving `size_in_mb`.
    #[must_use]
    pub fn from_bytes(size: u64) -> Self {
        Self {
            size,
            size_in_mb: size as f64 / BYTES_PER_MB,
        }
    }

    /// Whether the measurement is zero bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

impl Default for SizeValue {
    fn default() -> Self {
        Self::ZERO
    }
}

/// A single persisted size measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Resolved absolute path the measurement belongs to.
    #[serde(default)]
    pub key: String,
    /// When the measurement was taken.
    pub saved: DateTime<Utc>,
    /// The measurement itself.
    pub value: SizeValue,
}

impl CacheEntry {
    /// Create an entry stamped with `saved`.
    #[must_use]
    pub fn new(key: impl Into<String>, value: SizeValue, saved: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            saved,
            value,
        }
    }

    /// Age of the entry at `now`. Timestamps in the future count as age zero.
    #[must_use]
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.saved)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Whether the entry is still valid at `now`, i.e. `now - saved < max_age`.
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.age_at(now) < max_age
    }
}

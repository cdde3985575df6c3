//! Application configuration management.
//!
//! Settings are layered: built-in defaults, then a TOML file, then
//! `DCLEANER_*` environment variables. Command-line flags are applied last
//! with [`Config::apply_cli`].
//!
//! ```toml
//! target_dir = "node_modules"
//! sort_by = "size"
//! max_cache_age_secs = 300
//! data_dir = ".data"
//! cache_file = "cache.json"
//! io_threads = 4
//! include_empty = false
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cache::{
    CacheOptions, DEFAULT_CACHE_FILE, DEFAULT_DATA_DIR, DEFAULT_MAX_CACHE_AGE, DEFAULT_TARGET_DIR,
};
use crate::cleaner::SortBy;
use crate::cli::Cli;
use crate::scanner::DEFAULT_IO_THREADS;

/// Prefix of environment variables read by [`Config::load`].
pub const ENV_PREFIX: &str = "DCLEANER_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name of the directory to remove.
    pub target_dir: String,
    /// Default sort order.
    pub sort_by: SortBy,
    /// Maximum age of a cached size, in seconds.
    pub max_cache_age_secs: u64,
    /// Directory holding the cache file, relative to the working directory
    /// unless absolute.
    pub data_dir: PathBuf,
    /// Cache file name inside `data_dir`.
    pub cache_file: String,
    /// Number of directories measured concurrently.
    pub io_threads: usize,
    /// Keep candidates with empty target directories.
    pub include_empty: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_dir: DEFAULT_TARGET_DIR.to_string(),
            sort_by: SortBy::default(),
            max_cache_age_secs: DEFAULT_MAX_CACHE_AGE.as_secs(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            cache_file: DEFAULT_CACHE_FILE.to_string(),
            io_threads: DEFAULT_IO_THREADS,
            include_empty: false,
        }
    }
}

impl Config {
    /// Load the configuration.
    ///
    /// `path` names the TOML file; without it the default platform-specific
    /// path is used. A missing file contributes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or an environment variable holds a value
    /// of the wrong shape.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).or_else(Self::default_config_path);
        Self::figment(path.as_deref())
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .context("Invalid configuration")
    }

    /// Defaults merged with the TOML file at `path`, if any.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let figment = Figment::from(Serialized::defaults(Self::default()));
        match path {
            Some(path) => {
                log::debug!("Reading configuration from {}", path.display());
                figment.merge(Toml::file(path))
            }
            None => figment,
        }
    }

    /// Get the default platform-specific configuration path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dcleaner", "dcleaner")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Override settings with the flags given on the command line.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(ref target) = cli.target {
            self.target_dir.clone_from(target);
        }
        if let Some(sort) = cli.sort {
            self.sort_by = sort;
        }
        if let Some(age) = cli.max_cache_age {
            self.max_cache_age_secs = age.as_secs();
        }
        if let Some(threads) = cli.io_threads {
            self.io_threads = threads;
        }
        if cli.all {
            self.include_empty = true;
        }
    }

    /// Maximum age of a cached size.
    #[must_use]
    pub fn max_cache_age(&self) -> Duration {
        Duration::from_secs(self.max_cache_age_secs)
    }

    /// Cache options for a run rooted at `working_dir`.
    #[must_use]
    pub fn cache_options(&self, working_dir: impl Into<PathBuf>) -> CacheOptions {
        CacheOptions::new(working_dir)
            .with_target_dir(self.target_dir.clone())
            .with_data_dir(self.data_dir.clone())
            .with_cache_file(self.cache_file.clone())
            .with_max_age(self.max_cache_age())
    }
}

//! Candidate construction.
//!
//! A [`Candidate`] is a top-level directory under the working directory that
//! contains at least one target directory. The [`Scanner`] discovers them,
//! stats and sizes each one in parallel, and keeps the successes.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use rayon::prelude::*;

use crate::cache::{SizeCache, SizeValue};
use crate::progress::{Phase, ProgressCallback};

use super::sizer::Sizer;
use super::walker::get_directories;
use super::ScanError;

/// Default number of worker threads used to size candidates.
pub const DEFAULT_IO_THREADS: usize = 4;

const SECONDS_PER_DAY: u64 = 60 * 60 * 24;

/// A directory offered for cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Directory name, one segment below the working directory.
    pub name: String,
    /// Absolute path of the directory.
    pub path: PathBuf,
    /// Bytes held in target directories beneath it.
    pub size: u64,
    /// `size` in megabytes.
    pub size_in_mb: f64,
    /// Last modification time of the directory itself.
    pub mtime: SystemTime,
    /// Last access time of the directory itself.
    pub atime: SystemTime,
    /// Display summary, e.g. `Size: 5.00 MB | modified: 3d ago | accessed: 0d ago`.
    pub hint: String,
}

impl Candidate {
    /// Build a candidate, deriving `size_in_mb` and `hint`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        path: PathBuf,
        value: SizeValue,
        mtime: SystemTime,
        atime: SystemTime,
    ) -> Self {
        let hint = format_hint(value.size_in_mb, mtime, atime, SystemTime::now());
        Self {
            name: name.into(),
            path,
            size: value.size,
            size_in_mb: value.size_in_mb,
            mtime,
            atime,
            hint,
        }
    }

    /// The candidate's measurement.
    #[must_use]
    pub fn size_value(&self) -> SizeValue {
        SizeValue::from_bytes(self.size)
    }
}

/// Whole days between `then` and `now`, zero if `then` is in the future.
fn days_ago(then: SystemTime, now: SystemTime) -> u64 {
    now.duration_since(then)
        .unwrap_or(Duration::ZERO)
        .as_secs()
        / SECONDS_PER_DAY
}

fn format_hint(size_in_mb: f64, mtime: SystemTime, atime: SystemTime, now: SystemTime) -> String {
    format!(
        "Size: {:.2} MB | modified: {}d ago | accessed: {}d ago",
        size_in_mb,
        days_ago(mtime, now),
        days_ago(atime, now)
    )
}

/// Outcome of a candidate listing.
#[derive(Debug, Default)]
pub struct Choices {
    /// Candidates that were stat'ed and sized, in discovery order.
    pub candidates: Vec<Candidate>,
    /// Directories that failed and were left out.
    pub failures: Vec<(String, ScanError)>,
}

impl Choices {
    /// Candidate names only.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.candidates.iter().map(|c| c.name.clone()).collect()
    }

    /// Whether nothing was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Discovers and measures candidates.
pub struct Scanner<'a> {
    sizer: Sizer<'a>,
    target: String,
    io_threads: usize,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl<'a> Scanner<'a> {
    /// Create a scanner that reads and writes `cache`.
    #[must_use]
    pub fn new(cache: &'a SizeCache) -> Self {
        Self {
            sizer: Sizer::new(cache),
            target: cache.options().target_dir.clone(),
            io_threads: DEFAULT_IO_THREADS,
            progress: None,
        }
    }

    /// Bound the number of candidates sized concurrently.
    #[must_use]
    pub fn with_io_threads(mut self, io_threads: usize) -> Self {
        self.io_threads = io_threads.max(1);
        self
    }

    /// Report progress to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// The sizer backing this scanner.
    #[must_use]
    pub fn sizer(&self) -> &Sizer<'a> {
        &self.sizer
    }

    /// Top-level directories under `root` that contain the target directory.
    ///
    /// # Errors
    ///
    /// Fails only if `root` cannot be read.
    pub fn get_directories(&self, root: &Path) -> Result<Vec<String>, ScanError> {
        get_directories(root, &self.target)
    }

    /// Size of the target directories beneath `path`, through the cache.
    ///
    /// # Errors
    ///
    /// See [`Sizer::recursive_target_dir_size`].
    pub fn get_recursive_target_dir_size(&self, path: &Path) -> Result<SizeValue, ScanError> {
        self.sizer.recursive_target_dir_size(path)
    }

    /// List the candidates under `root`.
    ///
    /// Each directory is stat'ed and sized independently on a bounded pool;
    /// a failing directory is logged and recorded in
    /// [`Choices::failures`] without affecting the others. The cache is
    /// persisted once all work has settled.
    ///
    /// # Errors
    ///
    /// Fails when `root` itself cannot be read, which is distinct from an
    /// empty result.
    pub fn get_choices(&self, root: &Path) -> Result<Choices, ScanError> {
        self.phase_start(Phase::Discovery, 0);
        let directories = self.get_directories(root);
        self.phase_end(Phase::Discovery);
        let directories = directories?;
        log::debug!("get_choices {}: {:?}", root.display(), directories);

        self.phase_start(Phase::Sizing, directories.len());
        let done = AtomicUsize::new(0);
        let measure = |name: &String| {
            let result = self.build_candidate(root, name);
            let current = done.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref progress) = self.progress {
                progress.on_progress(current, name);
            }
            (name.clone(), result)
        };

        let outcomes: Vec<(String, Result<Candidate, ScanError>)> =
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.io_threads)
                .build()
            {
                Ok(pool) => pool.install(|| directories.par_iter().map(measure).collect()),
                Err(e) => {
                    log::warn!(
                        "Failed to build sizing pool ({}), using the global pool",
                        e
                    );
                    directories.par_iter().map(measure).collect()
                }
            };
        self.phase_end(Phase::Sizing);

        self.sizer.cache().persist();

        let mut choices = Choices::default();
        for (name, outcome) in outcomes {
            match outcome {
                Ok(candidate) => choices.candidates.push(candidate),
                Err(e) => {
                    log::error!("Error occurred while processing directory {}: {}", name, e);
                    choices.failures.push((name, e));
                }
            }
        }
        Ok(choices)
    }

    /// Candidate names under `root`, in discovery order.
    ///
    /// # Errors
    ///
    /// Fails when `root` itself cannot be read.
    pub fn get_choice_names(&self, root: &Path) -> Result<Vec<String>, ScanError> {
        Ok(self.get_choices(root)?.names())
    }

    fn build_candidate(&self, root: &Path, name: &str) -> Result<Candidate, ScanError> {
        let path = root.join(name);
        let metadata = std::fs::symlink_metadata(&path).map_err(|e| ScanError::from_io(&path, e))?;
        let mtime = metadata
            .modified()
            .map_err(|e| ScanError::from_io(&path, e))?;
        let atime = metadata.accessed().unwrap_or(mtime);
        let value = self.sizer.recursive_target_dir_size(&path)?;
        Ok(Candidate::new(name, path, value, mtime, atime))
    }

    fn phase_start(&self, phase: Phase, total: usize) {
        if let Some(ref progress) = self.progress {
            progress.on_phase_start(phase, total);
        }
    }

    fn phase_end(&self, phase: Phase) {
        if let Some(ref progress) = self.progress {
            progress.on_phase_end(phase);
        }
    }
}

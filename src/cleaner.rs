//! Cleaning orchestration.
//!
//! The [`Cleaner`] owns the [`SizeCache`] for one run and composes the
//! scanner and the delete action:
//!
//! 1. list candidates through the cache-assisted [`Scanner`]
//! 2. sort them descending by size, mtime or atime
//! 3. drop zero-size candidates unless asked to keep them
//! 4. let a [`Prompter`] pick the subset to clean and confirm the total
//! 5. delete the selection one candidate at a time, invalidating cache entries
//!
//! The cleaner performs no terminal I/O; prompting is delegated to the
//! [`Prompter`] the caller supplies.

use std::fmt;
use std::io;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actions::delete::{delete_dir, BatchDeleteResult, DeleteOutcome, DeleteResult};
use crate::cache::{CacheOptions, SizeCache};
use crate::progress::ProgressCallback;
use crate::scanner::{size_key, Candidate, Choices, ScanError, Scanner, DEFAULT_IO_THREADS};

/// Metric candidates are sorted by, largest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Bytes held in target directories.
    #[default]
    Size,
    /// Last modification time of the candidate directory.
    Mtime,
    /// Last access time of the candidate directory.
    Atime,
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortBy::Size => write!(f, "size"),
            SortBy::Mtime => write!(f, "mtime"),
            SortBy::Atime => write!(f, "atime"),
        }
    }
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "size" => Ok(SortBy::Size),
            "mtime" => Ok(SortBy::Mtime),
            "atime" => Ok(SortBy::Atime),
            other => Err(format!("Unknown sort key: '{other}'")),
        }
    }
}

/// Sort candidates descending by `sort_by`.
///
/// The sort is stable: candidates with equal values keep their discovery
/// order.
pub fn sort_candidates(candidates: &mut [Candidate], sort_by: SortBy) {
    match sort_by {
        SortBy::Size => candidates.sort_by(|a, b| b.size.cmp(&a.size)),
        SortBy::Mtime => candidates.sort_by(|a, b| b.mtime.cmp(&a.mtime)),
        SortBy::Atime => candidates.sort_by(|a, b| b.atime.cmp(&a.atime)),
    }
}

/// Drop zero-size candidates unless `include_empty` is set.
#[must_use]
pub fn filter_candidates(candidates: Vec<Candidate>, include_empty: bool) -> Vec<Candidate> {
    if include_empty {
        return candidates;
    }
    candidates.into_iter().filter(|c| c.size > 0).collect()
}

/// Summary shown before deleting.
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    /// Target directory name.
    pub target: String,
    /// Number of selected candidates.
    pub count: usize,
    /// Aggregate size of the selection in megabytes.
    pub total_size_mb: f64,
}

impl Confirmation {
    /// The question put to the user.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "Are you sure you want to remove {} from {} directories?\ntotal size: {:.2} MB",
            self.target, self.count, self.total_size_mb
        )
    }
}

/// Source of the user's selection and confirmation.
pub trait Prompter {
    /// Pick the candidates to clean. Returns their names.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the user could not be asked.
    fn select(&mut self, target: &str, candidates: &[Candidate]) -> io::Result<Vec<String>>;

    /// Confirm the deletion.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the user could not be asked.
    fn confirm(&mut self, confirmation: &Confirmation) -> io::Result<bool>;
}

/// Per-run switches supplied by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Metric to sort by.
    pub sort_by: SortBy,
    /// Keep zero-size candidates.
    pub include_empty: bool,
    /// Start from an empty cache instead of loading the cache file.
    pub no_cache: bool,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// No candidate survived discovery and filtering.
    NothingFound,
    /// The user selected nothing.
    NothingSelected,
    /// The user declined the confirmation.
    Aborted,
    /// The selection was processed.
    Completed,
}

/// What a run did.
#[derive(Debug)]
pub struct RunReport {
    /// How the run ended.
    pub status: RunStatus,
    /// Candidates offered for selection.
    pub offered: Vec<String>,
    /// Candidates the user selected.
    pub selected: Vec<String>,
    /// Aggregate size of the selection in megabytes.
    pub total_size_mb: f64,
    /// Deletion results.
    pub deleted: BatchDeleteResult,
    /// Directories that could not be listed, with the error message.
    pub scan_failures: Vec<(String, String)>,
}

impl RunReport {
    fn new(status: RunStatus) -> Self {
        Self {
            status,
            offered: Vec::new(),
            selected: Vec::new(),
            total_size_mb: 0.0,
            deleted: BatchDeleteResult::default(),
            scan_failures: Vec::new(),
        }
    }
}

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum CleanerError {
    /// The working directory could not be scanned.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// The prompter failed.
    #[error("prompt failed: {0}")]
    Prompt(#[from] io::Error),
}

/// Finds, measures and removes target directories under a working directory.
pub struct Cleaner {
    cache: SizeCache,
    io_threads: usize,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl Cleaner {
    /// Create a cleaner with an empty cache. Call
    /// [`prepare_cache`](Self::prepare_cache) to load the cache file.
    #[must_use]
    pub fn new(options: CacheOptions) -> Self {
        Self {
            cache: SizeCache::new(options),
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

    /// Report scan progress to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// The size cache owned by this cleaner.
    #[must_use]
    pub fn cache(&self) -> &SizeCache {
        &self.cache
    }

    /// Root under which candidates are discovered.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.cache.options().working_dir
    }

    /// Name of the directory being removed.
    #[must_use]
    pub fn target_dir(&self) -> &str {
        &self.cache.options().target_dir
    }

    /// Load the cache file and sweep expired entries, or with `no_cache`
    /// start from an empty table.
    pub fn prepare_cache(&mut self, no_cache: bool) {
        if no_cache {
            log::debug!("Cache disabled, clearing in-memory entries");
            self.cache.clear();
            return;
        }
        let options = self.cache.options().clone();
        self.cache.load(options);
        self.cache.cleanup_expired_entries();
    }

    /// A scanner bound to this cleaner's cache.
    #[must_use]
    pub fn scanner(&self) -> Scanner<'_> {
        let scanner = Scanner::new(&self.cache).with_io_threads(self.io_threads);
        match self.progress {
            Some(ref progress) => scanner.with_progress(Arc::clone(progress)),
            None => scanner,
        }
    }

    /// List candidates in discovery order.
    ///
    /// # Errors
    ///
    /// Fails when the working directory cannot be read.
    pub fn get_choices(&self) -> Result<Choices, ScanError> {
        self.scanner().get_choices(self.working_dir())
    }

    /// List candidates sorted by `sort_by`, without zero-size entries unless
    /// `include_empty` is set.
    ///
    /// # Errors
    ///
    /// Fails when the working directory cannot be read.
    pub fn candidates(&self, sort_by: SortBy, include_empty: bool) -> Result<Choices, ScanError> {
        let mut choices = self.get_choices()?;
        sort_candidates(&mut choices.candidates, sort_by);
        choices.candidates = filter_candidates(choices.candidates, include_empty);
        Ok(choices)
    }

    /// Aggregate size of the named candidates in megabytes, read through the
    /// cache. Candidates that cannot be measured count as zero.
    #[must_use]
    pub fn total_size_mb(&self, selected: &[String]) -> f64 {
        let scanner = self.scanner();
        selected
            .iter()
            .map(|name| {
                let path = self.working_dir().join(name);
                match scanner.get_recursive_target_dir_size(&path) {
                    Ok(value) => value.size_in_mb,
                    Err(e) => {
                        log::warn!("Could not measure {}: {}", path.display(), e);
                        0.0
                    }
                }
            })
            .sum()
    }

    /// Remove the target directories of one candidate, at every depth.
    #[must_use]
    pub fn delete_dir(&self, directory: &str) -> DeleteOutcome {
        delete_dir(self.working_dir(), directory, self.target_dir())
    }

    /// Delete the named candidates one at a time, dropping each one's cache
    /// entry, then persist the cache.
    #[must_use]
    pub fn delete_selected(&self, selected: &[String]) -> BatchDeleteResult {
        let mut result = BatchDeleteResult::default();

        for name in selected {
            let key = size_key(&self.working_dir().join(name), self.target_dir());
            let size = self
                .cache
                .get(&key)
                .ok()
                .flatten()
                .map_or(0, |value| value.size);

            let outcome = self.delete_dir(name);

            if let Err(e) = self.cache.remove(&key) {
                log::warn!("Could not invalidate cache entry for {}: {}", name, e);
            }

            if outcome.all_succeeded() {
                result.bytes_freed += size;
                result
                    .successes
                    .push(DeleteResult::new(name.clone(), size, outcome.removed));
            } else {
                let message = outcome
                    .failures
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                log::error!("Error occurred while removing directory {}: {}", name, message);
                result.failures.push((name.clone(), message));
            }
        }

        self.cache.persist();
        log::info!("{}", result.summary());
        result
    }

    /// Run the whole flow: scan, sort, filter, select, confirm, delete.
    ///
    /// # Errors
    ///
    /// Fails when the working directory cannot be scanned or the prompter
    /// fails. Individual scan and delete failures are reported in the
    /// [`RunReport`] instead.
    pub fn run(
        &mut self,
        prompter: &mut dyn Prompter,
        options: &RunOptions,
    ) -> Result<RunReport, CleanerError> {
        self.prepare_cache(options.no_cache);

        let choices = self.candidates(options.sort_by, options.include_empty)?;
        let scan_failures: Vec<(String, String)> = choices
            .failures
            .iter()
            .map(|(name, e)| (name.clone(), e.to_string()))
            .collect();

        if choices.is_empty() {
            log::info!(
                "No directories found to remove {} from",
                self.target_dir()
            );
            let mut report = RunReport::new(RunStatus::NothingFound);
            report.scan_failures = scan_failures;
            return Ok(report);
        }

        let offered = choices.names();
        let selected: Vec<String> = prompter
            .select(self.target_dir(), &choices.candidates)?
            .into_iter()
            .filter(|name| {
                let known = offered.contains(name);
                if !known {
                    log::warn!("Ignoring unknown selection: {}", name);
                }
                known
            })
            .collect();

        let mut report = RunReport::new(RunStatus::NothingSelected);
        report.offered = offered;
        report.scan_failures = scan_failures;

        if selected.is_empty() {
            log::info!("Nothing selected");
            return Ok(report);
        }

        log::info!(
            "Removing {} from {} directories in {}",
            self.target_dir(),
            selected.len(),
            self.working_dir().display()
        );

        report.total_size_mb = self.total_size_mb(&selected);
        let confirmation = Confirmation {
            target: self.target_dir().to_string(),
            count: selected.len(),
            total_size_mb: report.total_size_mb,
        };
        report.selected = selected;

        if !prompter.confirm(&confirmation)? {
            log::info!("Aborting");
            report.status = RunStatus::Aborted;
            return Ok(report);
        }

        report.deleted = self.delete_selected(&report.selected);
        report.status = RunStatus::Completed;
        log::info!(
            "Removal of {} from {} directories in {} completed.",
            self.target_dir(),
            report.selected.len(),
            self.working_dir().display()
        );
        Ok(report)
    }
}

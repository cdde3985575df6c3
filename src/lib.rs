//! dcleaner - dependency directory cleaner
//!
//! Finds every directory under a working directory that contains a target
//! directory (`node_modules` by default), measures how much space the target
//! directories take, and removes the ones the user selects. Sizes are kept in
//! a small JSON cache file so repeated runs within a few minutes skip the
//! disk walk.

pub mod actions;
pub mod cache;
pub mod cleaner;
pub mod cli;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod logging;
pub mod progress;
pub mod prompt;
pub mod scanner;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cleaner::{Cleaner, RunOptions, RunReport, RunStatus};
use crate::cli::Cli;
use crate::config::Config;
use crate::error::ExitCode;
use crate::progress::{Progress, ProgressCallback};
use crate::prompt::{AutoPrompter, TerminalPrompter};

/// Run the application for parsed command-line arguments.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the working directory
/// cannot be scanned, fixtures cannot be created or prompting fails.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_cli(&cli);
    log::debug!("Effective configuration: {:?}", config);

    let working_dir = resolve_working_dir(cli.working_dir.clone())?;
    let options = config.cache_options(&working_dir);

    if cli.init_test {
        fixtures::init_test_dirs(&options).context("Failed to create test directories")?;
    }

    let progress: Arc<dyn ProgressCallback> = Arc::new(Progress::new(cli.quiet));
    let mut cleaner = Cleaner::new(options)
        .with_io_threads(config.io_threads)
        .with_progress(progress);
    let run_options = RunOptions {
        sort_by: config.sort_by,
        include_empty: config.include_empty,
        no_cache: cli.no_cache,
    };

    let result = if cli.yes {
        cleaner.run(&mut AutoPrompter, &run_options)
    } else {
        cleaner.run(&mut TerminalPrompter::stdio(), &run_options)
    };
    let report = result.with_context(|| format!("Cannot clean {}", working_dir.display()))?;

    Ok(exit_code_for(&report))
}

/// Map a finished run to the process exit code.
#[must_use]
pub fn exit_code_for(report: &RunReport) -> ExitCode {
    match report.status {
        RunStatus::NothingFound | RunStatus::NothingSelected => ExitCode::NothingToClean,
        RunStatus::Aborted => ExitCode::Aborted,
        RunStatus::Completed => {
            if report.deleted.all_succeeded() && report.scan_failures.is_empty() {
                ExitCode::Success
            } else {
                ExitCode::PartialSuccess
            }
        }
    }
}

fn resolve_working_dir(dir: Option<PathBuf>) -> Result<PathBuf> {
    let dir = match dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Cannot determine the current directory")?,
    };
    std::path::absolute(&dir)
        .with_context(|| format!("Invalid working directory: {}", dir.display()))
}

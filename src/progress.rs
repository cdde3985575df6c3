//! Scan progress reporting using indicatif.
//!
//! The scanner reports through the [`ProgressCallback`] trait; [`Progress`]
//! renders it as a spinner while target directories are discovered and a bar
//! while candidates are sized.

use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Phases of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Walking the working directory for target directories.
    Discovery,
    /// Computing the size of each candidate.
    Sizing,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Discovery => write!(f, "discovery"),
            Phase::Sizing => write!(f, "sizing"),
        }
    }
}

/// Progress callback for the scan pipeline.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts. `total` is zero when unknown.
    fn on_phase_start(&self, phase: Phase, total: usize);

    /// Called after each item of the current phase is processed.
    fn on_progress(&self, current: usize, name: &str);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: Phase);
}

/// Terminal progress reporter.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter. With `quiet` nothing is drawn.
    ///
    /// # Examples
    ///
    /// ```
    /// use dcleaner::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
        }
    }

    fn discovery_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn sizing_style() -> ProgressStyle {
        ProgressStyle::with_template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█>-")
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: Phase, total: usize) {
        if self.quiet {
            return;
        }

        let pb = match phase {
            Phase::Discovery => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(Self::discovery_style());
                pb.set_message("Looking for target directories");
                pb.enable_steady_tick(Duration::from_millis(100));
                pb
            }
            Phase::Sizing => {
                let pb = ProgressBar::new(total as u64);
                pb.set_style(Self::sizing_style());
                pb.set_message("Measuring");
                pb
            }
        };
        *self.bar.lock().unwrap_or_else(PoisonError::into_inner) = Some(pb);
    }

    fn on_progress(&self, current: usize, name: &str) {
        if self.quiet {
            return;
        }

        if let Some(ref pb) = *self.bar.lock().unwrap_or_else(PoisonError::into_inner) {
            pb.set_position(current as u64);
            pb.set_message(truncate_name(name, 30));
        }
    }

    fn on_phase_end(&self, phase: Phase) {
        if self.quiet {
            return;
        }

        if let Some(pb) = self
            .bar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pb.finish_and_clear();
            log::debug!("Phase {} complete", phase);
        }
    }
}

/// Truncate a name for display, keeping its tail.
fn truncate_name(name: &str, max_len: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_len {
        return name.to_string();
    }
    let tail: String = chars[chars.len() - (max_len - 3)..].iter().collect();
    format!("...{}", tail)
}

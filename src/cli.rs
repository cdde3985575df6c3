//! Command-line interface definitions for dcleaner.
//!
//! A single command: scan the working directory, pick the candidates to
//! clean and remove their target directories.
//!
//! # Example
//!
//! ```bash
//! # Interactive run in the current directory
//! dcleaner
//!
//! # Clean every non-empty candidate under ~/projects without asking
//! dcleaner ~/projects --yes
//!
//! # Sort by last access and remove `target` directories instead
//! dcleaner ~/src --sort atime --target target
//!
//! # Create sample directories to try it out
//! dcleaner --init-test
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::cleaner::SortBy;

/// Find and remove dependency directories, largest first.
///
/// dcleaner lists every directory under WORKING_DIR that contains a target
/// directory (node_modules by default), with the total size of its target
/// directories, and removes the ones you select.
#[derive(Debug, Parser)]
#[command(name = "dcleaner")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to scan (defaults to the current directory)
    #[arg(value_name = "WORKING_DIR")]
    pub working_dir: Option<PathBuf>,

    /// Select every candidate and skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Include candidates whose target directories are empty
    #[arg(short = 'a', long)]
    pub all: bool,

    /// Create sample directories under the data directory and scan them
    #[arg(short = 't', long)]
    pub init_test: bool,

    /// Ignore the size cache file and measure everything again
    #[arg(short = 'n', long)]
    pub no_cache: bool,

    /// Sort candidates by this metric, largest first
    #[arg(long, value_enum, value_name = "KEY")]
    pub sort: Option<SortBy>,

    /// Name of the directory to remove
    #[arg(long, value_name = "NAME")]
    pub target: Option<String>,

    /// Path to a TOML configuration file
    ///
    /// If not specified, a default platform-specific path is used.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Maximum age of cached sizes (e.g., 300, 90s, 5m, 1h)
    #[arg(long, value_name = "AGE", value_parser = parse_duration)]
    pub max_cache_age: Option<Duration>,

    /// Number of directories measured concurrently
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,

    /// Report errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

/// Parse a human-readable duration.
///
/// Supports suffixes: s, m, h, d. Case-insensitive. Numbers without suffix
/// are treated as seconds.
///
/// # Examples
///
/// ```
/// use dcleaner::cli::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("300").unwrap(), Duration::from_secs(300));
/// assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
/// assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
/// ```
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number or an
/// unknown suffix.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Duration cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => (&s[..idx], s[idx..].trim().to_lowercase()),
        None => (s, String::new()),
    };

    let num: u64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "s" | "sec" => 1,
        "m" | "min" => 60,
        "h" => 60 * 60,
        "d" => 60 * 60 * 24,
        _ => return Err(format!("Unknown duration suffix: '{suffix}'")),
    };

    num.checked_mul(multiplier)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("Duration too large: '{s}'"))
}

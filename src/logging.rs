//! Logging setup.
//!
//! dcleaner logs through the `log` facade with an `env_logger` backend. The
//! level comes from, in priority order:
//!
//! 1. `RUST_LOG` (if set)
//! 2. `--quiet` (errors only) or `--verbose` (debug, then trace)
//! 3. Info
//!
//! Info records are progress messages meant for the user and are printed
//! bare. Warnings and errors carry their level. With `-v` every record gets
//! a timestamp, level and module path.
//!
//! ```rust,no_run
//! use dcleaner::logging::init_logging;
//!
//! init_logging(1, false);
//! log::debug!("visible with -v");
//! ```

use std::env;
use std::io::Write;

use env_logger::Builder;
use log::{Level, LevelFilter};

/// Initialize logging from the CLI verbosity flags.
///
/// Returns `false` if a logger was already installed, in which case the
/// existing one is kept.
pub fn init_logging(verbose: u8, quiet: bool) -> bool {
    let from_env = env::var_os("RUST_LOG").is_some();
    let mut builder = Builder::new();

    if from_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
    }
    configure_format(&mut builder, verbose);

    let installed = builder.try_init().is_ok();
    if installed {
        log::debug!(
            "Logging initialized at level {} ({})",
            current_level_name(),
            if from_env { "RUST_LOG" } else { "flags" }
        );
    }
    installed
}

/// Map the CLI flags to a level. `quiet` wins over `verbose`.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn configure_format(builder: &mut Builder, verbose: u8) {
    builder.format(move |buf, record| {
        let level = record.level();
        let style = buf.default_level_style(level);

        if verbose > 0 {
            writeln!(
                buf,
                "{} {style}{:<5}{style:#} [{}] {}",
                buf.timestamp_seconds(),
                level,
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        } else if level == Level::Info {
            writeln!(buf, "{}", record.args())
        } else {
            writeln!(buf, "{style}{:<5}{style:#} {}", level, record.args())
        }
    });
}

/// Name of the current maximum log level.
#[must_use]
pub fn current_level_name() -> &'static str {
    match log::max_level() {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}

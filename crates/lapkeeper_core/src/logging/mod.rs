//! Logging infrastructure for LapKeeper.
//!
//! This module provides:
//! - Application-wide `tracing` setup (stderr, optionally a daily log file)
//! - Per-run loggers with file + callback dual output
//! - Compact progress filtering
//!
//! # Example
//!
//! ```no_run
//! use lapkeeper_core::logging::{LogConfig, RunLogger};
//!
//! let logger = RunLogger::new("scan_20240101_120000", ".logs", LogConfig::default(), None).unwrap();
//!
//! logger.phase("Resolving");
//! logger.skip("Monza-car-1-2024.01.01-12.00.00.ld", "companion file missing");
//! logger.progress(5, 10);
//! logger.success("Scan completed");
//! ```

mod run_logger;
mod types;

pub use run_logger::RunLogger;
pub use types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize global tracing subscriber for application-wide logging.
///
/// This sets up a subscriber that:
/// - Respects RUST_LOG environment variable
/// - Falls back to the provided default level
/// - Outputs to stderr
///
/// Should be called once at application startup.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false),
        )
        .with(filter)
        .init();
}

/// Like [`init_tracing`], plus a daily-rolling `lapkeeper.log` in `log_dir`.
///
/// The returned guard must be held until exit so buffered lines are flushed.
pub fn init_tracing_with_file(
    default_level: LogLevel,
    log_dir: impl AsRef<Path>,
) -> std::io::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir.as_ref())?;

    let appender = tracing_appender::rolling::daily(log_dir.as_ref(), "lapkeeper.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false),
        )
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    Ok(guard)
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

//! Console and file logging for suite runs.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_FILE: &str = "test-execution.log";

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to create log directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("Failed to install subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Filter directive: `LOG_LEVEL`, then `RUST_LOG`, then the verbosity flag.
pub fn filter_directive(verbose: bool) -> String {
    std::env::var("LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| if verbose { "debug" } else { "info" }.to_string())
}

/// Log to stderr and to `<report_dir>/test-execution.log`. Keep the
/// returned guard alive until exit so the file writer flushes.
pub fn init(report_dir: &Path, verbose: bool) -> Result<WorkerGuard, LoggingError> {
    std::fs::create_dir_all(report_dir)?;
    let file_appender = tracing_appender::rolling::never(report_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_new(filter_directive(verbose))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .try_init()?;

    Ok(guard)
}

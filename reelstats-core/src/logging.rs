//! Logging infrastructure for reelstats
//!
//! Events go to a daily-rolling file under `$XDG_STATE_HOME/reelstats/`.
//! Stdout is reserved for analysis payloads, so when the state directory
//! cannot be used the writer falls back to stderr, never stdout.

use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const LOG_FILE_PREFIX: &str = "reelstats.log";

/// Guard that keeps the logging system alive
///
/// When dropped, flushes any pending log writes.
pub struct LoggingGuard {
    _worker: WorkerGuard,
}

/// Initialize the global subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. An unparseable level
/// falls back to `info`.
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard> {
    let log_dir = Config::state_dir();

    let mut fallback_reason = None;
    let (writer, worker) = match rolling_appender(&log_dir, config.max_files) {
        Ok(appender) => tracing_appender::non_blocking(appender),
        Err(e) => {
            fallback_reason = Some(e.to_string());
            tracing_appender::non_blocking(std::io::stderr())
        }
    };

    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter(&config.level))
        .with(layer)
        .try_init()
        .map_err(|e| Error::Config(format!("logging already initialized: {}", e)))?;

    match fallback_reason {
        Some(reason) => tracing::warn!(
            log_dir = %log_dir.display(),
            error = %reason,
            "State directory unusable, logging to stderr"
        ),
        None => tracing::debug!(
            log_dir = %log_dir.display(),
            level = %config.level,
            "Logging initialized"
        ),
    }

    Ok(LoggingGuard { _worker: worker })
}

fn rolling_appender(dir: &Path, max_files: usize) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(dir)?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .max_log_files(max_files.max(1))
        .build(dir)
        .map_err(|e| Error::Config(format!("failed to create log appender: {}", e)))
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize logging for tests (captured by the test harness)
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .with_span_events(FmtSpan::CLOSE)
        .try_init();
}

/// Returns the log file path
pub fn log_file_path() -> PathBuf {
    Config::log_path()
}

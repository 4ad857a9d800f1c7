use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::{FileLogConfig, LogRotation, LoggingConfig};
use crate::error::LoggingError;

// Keeps the file writer flushing until the process exits.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Installs a global subscriber for applications that have none of their own.
///
/// Libraries embedding the scheduler usually skip this and let their own
/// subscriber pick up the `pipeline_core` and `pipeline.events` targets.
/// Returns `Ok(false)` when `logging` names no sink, so nothing is installed.
pub fn init_tracing(logging: &LoggingConfig) -> Result<bool, LoggingError> {
    if !logging.console && logging.file.is_none() {
        return Ok(false);
    }

    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = build_filter(rust_log.as_deref(), &logging.level)?;

    let console_layer = logging.console.then(|| {
        let ansi = logging
            .ansi
            .unwrap_or_else(|| atty::is(atty::Stream::Stderr));
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(ansi)
            .with_target(true)
    });

    let file_layer = match &logging.file {
        Some(file) => {
            let writer = file_writer(file)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(true)
}

/// A non-blank `RUST_LOG` replaces the configured directives.
fn build_filter(rust_log: Option<&str>, level: &str) -> Result<EnvFilter, LoggingError> {
    let directives = rust_log
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(level);

    EnvFilter::try_new(directives).map_err(|source| LoggingError::InvalidFilter {
        filter: directives.to_string(),
        source,
    })
}

fn file_writer(file: &FileLogConfig) -> Result<NonBlocking, LoggingError> {
    let dir = PathBuf::from(file.directory.trim());
    std::fs::create_dir_all(&dir).map_err(|source| LoggingError::LogDirectory {
        path: dir.clone(),
        source,
    })?;

    let appender = appender(file.rotation, dir, &file.prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    // A second call keeps the first guard; its writer is dropped with the
    // rejected subscriber.
    let _ = FILE_GUARD.set(guard);
    Ok(writer)
}

fn appender(rotation: LogRotation, dir: PathBuf, prefix: &str) -> RollingFileAppender {
    match rotation {
        LogRotation::Never => tracing_appender::rolling::never(dir, prefix),
        LogRotation::Hourly => tracing_appender::rolling::hourly(dir, prefix),
        LogRotation::Daily => tracing_appender::rolling::daily(dir, prefix),
    }
}

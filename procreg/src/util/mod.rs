//! Logging setup.

use std::path::Path;

use procreg_shared::errors::{ProcregError, ProcregResult};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Log file name prefix inside the log directory.
const LOG_FILE_PREFIX: &str = "procreg.log";

/// Build an `EnvFilter` from `RUST_LOG`, falling back to `default`.
pub fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Log to stderr. Does nothing if a global subscriber is already set.
pub fn init_logging(default_filter: &str) {
    let _ = tracing_subscriber::registry()
        .with(env_filter(default_filter))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .try_init();
}

/// Log to a daily-rotated file under `log_dir`.
///
/// The returned guard flushes buffered lines on drop; keep it alive for as
/// long as the process logs.
pub fn init_file_logging(log_dir: &Path, default_filter: &str) -> ProcregResult<WorkerGuard> {
    std::fs::create_dir_all(log_dir).map_err(|e| {
        ProcregError::Config(format!(
            "failed to create log dir {}: {}",
            log_dir.display(),
            e
        ))
    })?;

    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    register_to_tracing(non_blocking, env_filter(default_filter));
    Ok(guard)
}

fn register_to_tracing(non_blocking: NonBlocking, env_filter: EnvFilter) {
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_ansi(false),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_logging_creates_dir() {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = temp_dir.path().join("logs");

        let guard = init_file_logging(&log_dir, "debug").unwrap();
        tracing::info!("hello from test");
        drop(guard);

        assert!(log_dir.is_dir());
    }
}

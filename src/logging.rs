use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "station_entities=info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Initializes console logging, plus JSON file logging when a log directory is given.
///
/// The returned guard must be held until exit so buffered file logs get flushed.
pub fn init_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Fall back to console-only when the directory can't be created
    let dir_error = log_dir.and_then(|dir| fs::create_dir_all(dir).err());
    let file_dir = log_dir.filter(|_| dir_error.is_none());

    let (file_layer, guard) = match file_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "station_entities.log");
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
            (Some(fmt::layer().json().with_writer(non_blocking_writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter())
        .with(file_layer)
        .with(fmt::layer().with_writer(std::io::stdout).with_target(false))
        .init();

    if let (Some(dir), Some(e)) = (log_dir, dir_error) {
        tracing::warn!("Could not create log directory {}: {}", dir.display(), e);
    }
    guard
}

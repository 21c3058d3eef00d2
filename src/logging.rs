use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::constants::{LOG_DIR, LOG_FILE_PREFIX};

const DEFAULT_FILTER: &str = "artifact_pipeline=info";

/// Initializes the logging system with both console and file output.
///
/// `RUST_LOG` overrides the default filter when set.
pub fn init_logging() {
    let _ = fs::create_dir_all(LOG_DIR);

    // Daily-rotated JSON log file, written off the calling thread
    let file_appender = tracing_appender::rolling::daily(LOG_DIR, LOG_FILE_PREFIX);
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);
    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stdout);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // A subscriber installed earlier stays in place
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    // Keep the writer alive for the whole process so buffered lines are flushed
    std::mem::forget(guard);
}

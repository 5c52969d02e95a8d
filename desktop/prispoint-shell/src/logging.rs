//! Logging setup with file rotation.

use std::path::{Path, PathBuf};

use prispoint_config::LoggingConfig;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

const MAX_LOG_FILES: usize = 7;

/// Setup logging with console and rotating file output.
///
/// # Log Layers
/// - Console: stderr, so stdout stays free for `--json` status lines
/// - File: plain text, daily rotation, 7 files kept
///
/// `RUST_LOG` overrides the configured level.
pub fn setup_logging(
    log_dir: &Path,
    logging: &LoggingConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(log_dir)?;

    let console_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr);

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(&logging.file_prefix)
        .filename_suffix("log")
        .build(log_dir)?;

    let file_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_writer(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_directive()));

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

/// Path of today's log file.
pub fn current_log_path(log_dir: &Path, logging: &LoggingConfig) -> PathBuf {
    let today = chrono::Local::now().format("%Y-%m-%d");
    log_dir.join(format!("{}.{today}.log", logging.file_prefix))
}

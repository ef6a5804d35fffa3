//! Logging initialization
//!
//! Call once at startup, after the configuration is loaded. The returned
//! guard flushes the non-blocking writer on drop and must live as long as
//! the process.

use std::io::Write;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;

use crate::config::LoggingConfig;

const DEFAULT_LOG_FILE: &str = "tokenlink.log";

type BoxedWriter = Box<dyn Write + Send + Sync>;

/// Where log lines go. Problems opening a file fall back to stdout.
fn build_writer(config: &LoggingConfig) -> (BoxedWriter, bool) {
    let Some(log_file) = config.file.as_deref().filter(|f| !f.is_empty()) else {
        return (Box::new(std::io::stdout()), true);
    };

    if config.enable_rotation {
        let path = Path::new(log_file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or(DEFAULT_LOG_FILE);

        match rolling::Builder::new()
            .rotation(rolling::Rotation::DAILY)
            .filename_prefix(file_name.trim_end_matches(".log"))
            .filename_suffix("log")
            .max_log_files(config.max_backups.max(1) as usize)
            .build(dir)
        {
            Ok(appender) => return (Box::new(appender), false),
            Err(e) => eprintln!("[WARN] Cannot create rolling log in {:?}: {}", dir, e),
        }
    } else {
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
        {
            Ok(file) => return (Box::new(file), false),
            Err(e) => eprintln!("[WARN] Cannot open log file {}: {}", log_file, e),
        }
    }

    (Box::new(std::io::stdout()), true)
}

pub fn init_logging(config: &LoggingConfig) -> WorkerGuard {
    let (writer, is_console) = build_writer(config);
    let (non_blocking, guard) = tracing_appender::non_blocking(writer);

    let filter = tracing_subscriber::EnvFilter::try_new(&config.level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(filter)
        .with_level(true)
        .with_ansi(is_console);

    // try_init: a second call (e.g. from tests) keeps the first subscriber
    let result = if config.format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        eprintln!("[WARN] Logging already initialized: {}", e);
    }

    guard
}

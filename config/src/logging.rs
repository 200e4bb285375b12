//! Tracing initialization shared by the binaries (feature `tracing-init`).
//!
//! - **RUST_LOG**: filter, e.g. `info`, `databot=debug`. Default: `info`.
//! - Logs go to stderr so stdout stays free for replies (chat REPL, `find` output).
//! - When a log directory is given, a daily-rotated `databot.log` is written there as well.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "databot.log";

/// Keeps the file writer alive; drop it last (end of `main`) so buffered lines are flushed.
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,hyper_util=off"))
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init(log_dir: Option<&Path>) -> Result<LogGuard, Box<dyn std::error::Error>> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter());

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter());
            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(file_layer)
                .try_init()?;
            Ok(LogGuard { _file: Some(guard) })
        }
        None => {
            tracing_subscriber::registry().with(stderr_layer).try_init()?;
            Ok(LogGuard { _file: None })
        }
    }
}

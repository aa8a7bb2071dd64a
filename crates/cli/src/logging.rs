//! Tracing subscriber setup
//!
//! Every event at or above the filter level goes to a daily rolling JSON log
//! in the support directory. The console only shows events with `--debug`,
//! since user-facing errors are printed by `main`.

use std::path::Path;

use anyhow::Context;
use patcher_domain::constants::LOG_FILE_NAME;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_FILTER: &str = "info";
const DEBUG_FILTER: &str = "debug,hyper=info,hyper_util=info,rustls=info";

/// Initialize the global subscriber.
///
/// `RUST_LOG` overrides the default filter. The returned guard flushes the
/// file writer and must be held until the process exits.
///
/// # Errors
/// Fails if the log directory cannot be created or a subscriber is already
/// installed.
pub fn init(debug: bool, log_dir: &Path) -> anyhow::Result<WorkerGuard> {
    let default_filter = if debug { DEBUG_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .context("invalid log filter")?;

    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME));

    let console_level = if debug { LevelFilter::TRACE } else { LevelFilter::OFF };
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_filter(console_level);

    let file_layer = fmt::layer()
        .json()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_current_span(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    let console_enabled = debug;
    tracing::debug!(log_dir = %log_dir.display(), console_enabled, "Logging initialized");
    Ok(guard)
}

use color_eyre::{eyre::eyre, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config;

/// Send tracing output to `$XDG_DATA_HOME/postcache/postcache.log`.
///
/// Stdout is left for command output. Filtering follows `POSTCACHE_LOG`
/// (e.g. `POSTCACHE_LOG=postcache=debug`). Keep the returned guard alive
/// until exit or buffered lines are lost.
pub fn init() -> Result<WorkerGuard> {
  let dir = config::data_dir()?;
  std::fs::create_dir_all(&dir).map_err(|e| eyre!("Failed to create log directory: {}", e))?;

  let appender = tracing_appender::rolling::never(&dir, "postcache.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter =
    EnvFilter::try_from_env("POSTCACHE_LOG").unwrap_or_else(|_| EnvFilter::new("postcache=info"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  Ok(guard)
}

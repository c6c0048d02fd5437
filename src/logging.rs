use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

pub const LOG_DIR: &str = "logs";
pub const LOG_FILE: &str = "server.log";

/// Server logging: one layer to stdout, one appending to `logs/server.log`.
/// `RUST_LOG` wins over `debug` when set.
pub fn init_server_logging(log_dir: &Path, debug: bool) -> Result<()> {
    fs::create_dir_all(log_dir).with_context(|| format!("Could not create logs directory {}", log_dir.display()))?;

    let path = log_dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Could not open log file {}", path.display()))?;

    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_target(false).with_ansi(false).with_writer(Mutex::new(file)))
        .try_init()
        .context("Could not install log subscriber")?;

    if debug {
        tracing::debug!("Debug logging enabled");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwritable_log_dir_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();
        let err = init_server_logging(&blocker.join("logs"), false).unwrap_err();
        assert!(err.to_string().contains("logs directory"));
    }
}

//! Logging init: append to a file under the XDG state dir, or stderr when
//! that is not possible.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,freshfetch=debug,freshfetch_core=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Path of the log file: `~/.local/state/freshfetch/freshfetch.log`.
pub fn log_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("freshfetch")?;
    Ok(xdg_dirs.get_state_home().join("freshfetch.log"))
}

/// Log to `freshfetch.log` in the XDG state directory.
/// Errors if the file cannot be opened; callers fall back to [`init_logging_stderr`].
pub fn init_logging() -> Result<()> {
    let path = log_path()?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    tracing::info!("freshfetch logging initialized at {}", path.display());
    Ok(())
}

/// Log to stderr only. Safe to call when a subscriber is already installed.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

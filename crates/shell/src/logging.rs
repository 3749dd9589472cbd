//! Logging setup: stderr plus `<data-dir>/logs/shell.log`

use anyhow::{Context, Result};
use proton_wallet_core::config::LOG_DIR_NAME;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "PROTON_LOG";
pub const LOG_FILE: &str = "shell.log";

pub fn init_logging(data_dir: &Path) -> Result<()> {
    let path = data_dir.join(LOG_DIR_NAME).join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Arc::new(file).and(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install logger: {e}"))?;

    Ok(())
}

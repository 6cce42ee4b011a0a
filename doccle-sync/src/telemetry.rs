//! Tracing setup: one stdout layer and one plain-text file layer.
//!
//! The log file is `{log_dir}/doccle_sync_{YYYYmmdd_HHMMSS}.log`, one per
//! process start. `RUST_LOG` overrides the default `info` filter.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub fn log_file_name(started: chrono::DateTime<chrono::Local>) -> String {
    format!("doccle_sync_{}.log", started.format("%Y%m%d_%H%M%S"))
}

/// Installs the global subscriber and returns the path of the log file.
pub fn init(log_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
    let path = log_dir.join(log_file_name(chrono::Local::now()));
    let file = File::create(&path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_log_file_name_carries_start_timestamp() {
        let started = chrono::Local
            .with_ymd_and_hms(2024, 3, 1, 9, 5, 7)
            .single()
            .unwrap();
        assert_eq!(log_file_name(started), "doccle_sync_20240301_090507.log");
    }
}

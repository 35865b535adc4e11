//! File logging setup.
//!
//! The loop shares the terminal with whatever renders it, so logs go to a
//! file under the data dir instead of stdout. `RUST_LOG` overrides the
//! default `debug` filter.

use std::path::PathBuf;

use fermata_model::platform;

/// Install the global `tracing` subscriber writing to
/// [`platform::log_file_path`]. Returns the path so the embedder can tell
/// the operator where to tail. Call at most once per process.
pub fn init_file_logging() -> anyhow::Result<PathBuf> {
    let log_path = platform::log_file_path();
    if let Some(dir) = log_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    Ok(log_path)
}

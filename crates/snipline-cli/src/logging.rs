//! Trace output for the CLI.
//!
//! The terminal belongs to the playground, so events go to the log file
//! named in the config. Filter with `RUST_LOG`, e.g.
//! `RUST_LOG=snipline_engine::tree=trace`.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing::Dispatch;
use tracing_subscriber::EnvFilter;

/// Builds a subscriber appending to `path`, for injection into snippet
/// instances.
pub fn file_tracer(path: &Path) -> anyhow::Result<Dispatch> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let subscriber = tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .with_env_filter(filter)
        .finish();
    Ok(Dispatch::new(subscriber))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_events_land_in_log_file() {
        let temp_dir = TempDir::new().unwrap();
        let log_file = temp_dir.path().join("logs").join("snipline.log");

        let dispatch = file_tracer(&log_file).unwrap();
        tracing::dispatcher::with_default(&dispatch, || {
            tracing::warn!(answer = 42, "hello from the test");
        });

        let content = std::fs::read_to_string(&log_file).unwrap();
        assert!(content.contains("hello from the test"));
        assert!(content.contains("answer=42"));
    }
}

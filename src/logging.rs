//! Tracing subscribers for the two binaries.

use std::fs::OpenOptions;
use std::path::Path;

use tracing::Level;

/// Human-readable events on stderr, so stdout stays free for the report.
pub fn init_stderr(level: Level) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(level)
        .init();
}

/// Appends plain-text events to `path`.
pub fn init_file(path: &Path, level: Level) -> std::io::Result<()> {
    let log_file = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(level)
        .init();
    Ok(())
}

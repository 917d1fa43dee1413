//! Log initialization for hosts embedding the preference system

use anyhow::{Context, Result};
use std::path::Path;

/// Route `log` output to a file, truncated on each start
///
/// Filtering follows `RUST_LOG`. Calling this twice is harmless; the second
/// call leaves the existing logger in place.
pub fn init_file_logging(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {:?}", path))?;

    if env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .try_init()
        .is_err()
    {
        log::debug!("Logger already initialized, keeping existing configuration");
    }
    Ok(())
}

/// Logger for unit and integration tests
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

//! Test harness helpers.

use tempfile::NamedTempFile;
use tracing_subscriber::EnvFilter;

/// Set up test logging with the given filter.
///
/// Output goes through the test writer, so it is captured per test. Safe to
/// call more than once.
pub fn setup_test_logging(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_test_writer()
        .try_init();
}

/// Write `content` to a temporary `.toml` file.
///
/// # Panics
///
/// Panics if the file cannot be created or written.
#[must_use]
pub fn test_config_file(content: &str) -> NamedTempFile {
    use std::io::Write;

    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

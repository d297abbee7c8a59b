//! Logging setup
//!
//! Events always go to stderr. With a log file configured they are also
//! appended to it, without ANSI colours, so restarts keep earlier history.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::AppError;

/// Filter used when `RUST_LOG` is unset or invalid
pub const DEFAULT_FILTER: &str = "chat_relay=info";

/// Install the global subscriber
///
/// Filtering follows `RUST_LOG`, e.g. `RUST_LOG=debug` or
/// `RUST_LOG=chat_relay=trace`.
pub fn init(log_file: Option<&Path>) -> Result<(), AppError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let file_layer = match log_file {
        Some(path) => Some(
            fmt::layer()
                .with_writer(Mutex::new(open_log_file(path)?))
                .with_ansi(false)
                .with_target(true),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))
}

/// Open `path` for appending, creating it if missing
pub fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_log_file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.log");

        open_log_file(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_log_file_appends_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.log");

        writeln!(open_log_file(&path).unwrap(), "first run").unwrap();
        writeln!(open_log_file(&path).unwrap(), "second run").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "first run\nsecond run\n");
    }

    #[test]
    fn test_log_file_in_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("relay.log");

        assert!(open_log_file(&path).is_err());
    }
}

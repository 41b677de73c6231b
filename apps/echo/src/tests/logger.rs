use crate::error::EchoError;
use crate::logger::{initialize, initialize_internal};

use std::path::PathBuf;

use log::LevelFilter;
use serial_test::serial;
use tempfile::TempDir;

/// **VALUE**: A second setup call is harmless.
///
/// **WHY THIS MATTERS**: `main` sets the logger up, and test binaries may
/// reach the same path again; `log` only accepts one global logger.
///
/// **BUG THIS CATCHES**: Would catch losing the `Once`/`AtomicBool` guard,
/// which turns the second call into a "logger already set" error.
#[test]
#[serial]
fn given_logger_initialized_when_called_again_then_returns_ok() {
    // GIVEN: A writable log directory
    let log_dir = TempDir::new().unwrap();

    // WHEN: Setting the logger up twice at different levels
    let first = initialize(log_dir.path(), LevelFilter::Debug);
    let second = initialize(log_dir.path(), LevelFilter::Trace);

    // THEN: Both calls succeed
    assert!(first.is_ok(), "first setup failed: {first:?}");
    assert!(second.is_ok(), "repeat setup failed: {second:?}");
}

/// **VALUE**: An unusable log directory comes back as an error.
///
/// **BUG THIS CATCHES**: Would catch the log file being opened with
/// `unwrap`, which aborts startup with a panic instead of a message.
#[test]
#[serial]
fn given_unwritable_log_dir_when_dispatch_built_then_echo_error() {
    // GIVEN: A directory path underneath a device file
    let log_dir = PathBuf::from("/dev/null/echo-logs");

    // WHEN: Building the dispatch
    let result = initialize_internal(&log_dir, LevelFilter::Info);

    // THEN: The failure names the log file
    match result {
        Err(EchoError::Echo { message, .. }) => {
            assert!(message.contains("log file"), "unexpected message: {message}");
        }
        other => panic!("Expected Echo error, got {other:?}"),
    }
}

use std::fs;

use boot2gui::config::LoggingLevel;
use boot2gui::logging::{self, LOG_FILE_NAME};

// Installs the global subscriber, so it lives in its own test binary.
#[test]
fn dropping_the_guard_flushes_every_line() {
    let dir = tempfile::tempdir().unwrap();
    let guard = logging::init(LoggingLevel::Info, Some(dir.path()));
    assert!(guard.is_some());

    for step in 0..200 {
        tracing::warn!("step {step}");
    }
    tracing::error!("last line");
    drop(guard);

    let log = fs::read_to_string(dir.path().join(LOG_FILE_NAME)).unwrap();
    assert_eq!(log.lines().filter(|line| line.contains("step ")).count(), 200);
    assert!(log.lines().last().is_some_and(|line| line.contains("last line")));
}

// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingLevel;

pub const LOG_FILE_NAME: &str = "boot2gui.log";

const OUR_CRATES: &[&str] = &["boot2gui", "boot2gui_sys", "boot2gui_udisks"];

/// Filter used when `RUST_LOG` is not set: our crates at `level`, everything
/// else at warn.
pub fn default_filter(level: LoggingLevel) -> String {
    let mut directives: Vec<String> = OUR_CRATES
        .iter()
        .map(|krate| format!("{}={}", krate, level.as_directive()))
        .collect();
    directives.push("warn".to_string());
    directives.join(",")
}

/// Install the global subscriber: stderr always, plus `<log_dir>/boot2gui.log`
/// when `log_dir` is given.
///
/// File lines are written by a background worker. Keep the returned guard
/// alive until exit; dropping it flushes whatever is still buffered.
#[must_use = "dropping the guard stops file logging"]
pub fn init(level: LoggingLevel, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match log_dir.map(file_writer) {
        Some(Ok((writer, guard))) => {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .boxed();
            (Some(layer), Some(guard))
        }
        Some(Err(e)) => {
            eprintln!("boot2gui: failed to initialize file logging: {e:#}");
            (None, None)
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

fn file_writer(
    dir: &Path,
) -> std::io::Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
    Ok(tracing_appender::non_blocking(appender))
}

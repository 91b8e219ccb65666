use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::settings::config_dir;

const LOG_ENV: &str = "SALESCOPE_LOG";
const DEFAULT_FILTER: &str = "warn";

pub fn log_file_path() -> PathBuf {
    config_dir().join("salescope.log")
}

/// Install the global subscriber. The dashboard owns the terminal, so it logs
/// to the file only; other commands also log to stderr.
pub fn init(to_stderr: bool) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let file_layer = std::fs::create_dir_all(config_dir())
        .and_then(|_| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file_path())
        })
        .ok()
        .map(|file| {
            tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false)
        });

    let stderr_layer = to_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init();
}

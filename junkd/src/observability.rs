//! Logging setup for the junkd binary.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Arc;
use std::{env, io};

use anyhow::Context;
use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, prelude::*};

/// Initializes the global tracing subscriber.
///
/// Logs always go to stderr; with `log_path` set, a plain-text copy is also
/// appended to that file.
pub fn initialize_tracing(log_path: Option<&Path>) -> anyhow::Result<()> {
    let (level, env_filter) = parse_rust_log();
    let format = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    let file_layer = log_path
        .map(open_log_file)
        .transpose()
        .context("failed to open log file")?
        .map(|file| {
            tracing_subscriber::fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true)
                .with_filter(LevelFilter::from(level))
        });

    tracing_subscriber::registry()
        .with(format.with_filter(LevelFilter::from(level)))
        .with(file_layer)
        .with(env_filter)
        .init();

    Ok(())
}

fn open_log_file(path: &Path) -> io::Result<Arc<File>> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(Arc::new)
}

fn parse_rust_log() -> (Level, EnvFilter) {
    // Try to parse RUST_LOG as a simple level filter and apply default levels internally.
    // Otherwise, use it literally if the user knows which overrides they want to run.
    let level = match env::var(EnvFilter::DEFAULT_ENV) {
        Ok(value) => match value.parse::<Level>() {
            Ok(level) => level,
            Err(_) => return (Level::TRACE, EnvFilter::new(value)),
        },
        Err(_) => Level::INFO,
    };

    // This is the maximum verbosity that will be logged, we filter this down to `level`.
    let env_filter = EnvFilter::new(
        "INFO,\
        junkd=TRACE,\
        junkd_client=TRACE,\
        ",
    );

    (level, env_filter)
}

use crate::error::Result;
use std::fs::File;
use std::path::PathBuf;
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    fmt::{self},
    prelude::*,
};

/// Target prefix shared by the `mbnn` library and this binary.
const MBNN_TARGET: &str = "mbnn";

fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// `-v` raises only our own events; dependencies stay at warnings.
fn console_filter(verbosity: u8, quiet: bool) -> Targets {
    let others = if quiet {
        LevelFilter::ERROR
    } else {
        LevelFilter::WARN
    };
    Targets::new()
        .with_default(others)
        .with_target(MBNN_TARGET, level_filter(verbosity, quiet))
}

/// The log file always records model loading and evaluation summaries.
fn file_filter(verbosity: u8) -> Targets {
    let level = level_filter(verbosity, false).max(LevelFilter::INFO);
    Targets::new()
        .with_default(LevelFilter::WARN)
        .with_target(MBNN_TARGET, level)
}

pub fn setup_logging(verbosity: u8, quiet: bool, log_file: &Option<PathBuf>) -> Result<()> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact()
        .with_filter(console_filter(verbosity, quiet));

    let subscriber = tracing_subscriber::registry().with(stderr_layer);

    if let Some(path) = log_file {
        let file = File::create(path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_thread_ids(true)
            .with_target(true)
            .with_filter(file_filter(verbosity));

        subscriber.with(file_layer).init();
    } else {
        subscriber.init();
    }

    Ok(())
}

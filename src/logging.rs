//! Run logging: `run.log` in the output directory, mirrored to stderr

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use env_logger::{Builder, Target, WriteStyle};
use log::{LevelFilter, Log, Metadata, Record};

use crate::analysis::{RunWarning, WarningSink};

pub const LOG_FILE_NAME: &str = "run.log";

/// Forwards every record to both loggers, each applying its own filter
struct TeeLogger {
    file: env_logger::Logger,
    stderr: env_logger::Logger,
}

impl Log for TeeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.file.enabled(metadata) || self.stderr.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if self.file.matches(record) {
            self.file.log(record);
        }
        if self.stderr.matches(record) {
            self.stderr.log(record);
        }
    }

    fn flush(&self) {
        self.file.flush();
        self.stderr.flush();
    }
}

/// Install the process logger. Default level is `info`, `RUST_LOG` overrides
/// it, and `quiet` keeps stderr to warnings and errors.
pub fn init_logging(output_dir: &Path, quiet: bool) -> Result<PathBuf> {
    let path = output_dir.join(LOG_FILE_NAME);
    let file = File::create(&path)
        .with_context(|| format!("failed to create log file: {}", path.display()))?;

    let file_logger = Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_secs()
        .write_style(WriteStyle::Never)
        .target(Target::Pipe(Box::new(file)))
        .build();

    let mut stderr = Builder::new();
    stderr
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format_timestamp(None)
        .target(Target::Stderr);
    if quiet {
        stderr.filter_level(LevelFilter::Warn);
    }
    let stderr_logger = stderr.build();

    let max_level = file_logger.filter().max(stderr_logger.filter());
    log::set_boxed_logger(Box::new(TeeLogger {
        file: file_logger,
        stderr: stderr_logger,
    }))
    .context("logger already initialized")?;
    log::set_max_level(max_level);

    Ok(path)
}

/// Routes component warnings and progress to the `log` facade
#[derive(Debug, Default)]
pub struct LogSink {
    warnings: AtomicUsize,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of warnings reported so far
    pub fn warning_count(&self) -> usize {
        self.warnings.load(Ordering::Relaxed)
    }
}

impl WarningSink for LogSink {
    fn warn(&self, warning: RunWarning) {
        self.warnings.fetch_add(1, Ordering::Relaxed);
        log::warn!("{warning}");
    }

    fn progress(&self, message: &str) {
        log::info!("{message}");
    }
}

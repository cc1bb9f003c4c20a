//! Error types for the guide finder.

use std::path::PathBuf;

use thiserror::Error;

/// Run-fatal errors. Anything local to a single candidate is reported as a
/// [`RunWarning`](crate::analysis::RunWarning) instead.
#[derive(Debug, Error)]
pub enum Error {
    /// A sequence file is malformed or unreadable.
    #[error("invalid sequence file {}: {reason}", path.display())]
    InputFormat { path: PathBuf, reason: String },

    /// A parameter is out of range or inconsistent with another.
    #[error("{0}")]
    Config(String),

    /// The output destination could not be written.
    #[error("failed to write {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn input_format(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::InputFormat {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn output_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OutputWrite {
            path: path.into(),
            source,
        }
    }
}

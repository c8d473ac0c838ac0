//! Error types produced by the ingest crate.
//!
//! # Error Categories
//!
//! | Error | Category | Handling |
//! |-------|----------|----------|
//! | [`NotFound`](IngestError::NotFound) | Missing resource | Callers usually skip the unit |
//! | [`Io`](IngestError::Io) | I/O failure | Fatal for the resource |
//! | [`MalformedLine`](IngestError::MalformedLine) | Strict parse | Only raised by strict operations such as [`sort_file`](crate::sort_file) |
//! | [`InvalidConfig`](IngestError::InvalidConfig) | Configuration | Fix the config |
//!
//! The lenient loader never raises `MalformedLine`: bad lines are dropped and
//! counted in [`LoadReport`](crate::LoadReport) instead.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while reading, writing or discovering datasets.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IngestError {
    /// The file or directory does not exist.
    #[error("resource not found: {0}")]
    NotFound(PathBuf),

    /// Any other I/O failure. The message is the rendered `std::io::Error`.
    #[error("i/o error on {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// A line failed to parse during a strict operation.
    #[error("malformed json at {path}:{line}: {message}")]
    MalformedLine {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}

impl IngestError {
    pub(crate) fn io(path: &Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            return IngestError::NotFound(path.to_path_buf());
        }
        IngestError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    /// True when the error means "nothing there", which orchestration treats
    /// as a skip rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, IngestError::NotFound(_))
    }
}

use thiserror::Error;

/// Errors that can occur while fingerprinting raw text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CanonicalError {
    #[error("invalid json: {0}")]
    InvalidJson(String),
}

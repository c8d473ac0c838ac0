use thiserror::Error;

/// Errors raised by usage analysis.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum IndexError {
    #[error("usage fraction must be within [0, 1], got {0}")]
    InvalidFraction(f64),
}

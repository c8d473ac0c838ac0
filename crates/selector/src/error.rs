use thiserror::Error;

/// Errors raised before any selection work starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SelectorError {
    #[error("invalid selector config: {0}")]
    InvalidConfig(String),
}

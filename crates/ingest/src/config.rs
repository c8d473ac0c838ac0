//! Configuration for loading and discovering datasets.
//!
//! # Examples
//!
//! ```rust
//! use ingest::{DiscoveryConfig, LoadConfig};
//!
//! // Emulate a scoring-time row limit of 250 records.
//! let load = LoadConfig::default().with_max_rows(250);
//! assert!(load.validate().is_ok());
//!
//! let discovery = DiscoveryConfig::default();
//! assert_eq!(discovery.prefix, "miner_");
//! assert_eq!(discovery.data_file, "data.jsonl");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the JSONL file inside every participant or reference directory.
pub const DEFAULT_DATA_FILE: &str = "data.jsonl";

/// Directory prefix identifying participant submissions.
pub const DEFAULT_PARTICIPANT_PREFIX: &str = "miner_";

/// Runtime configuration for the JSONL loader.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoadConfig {
    /// Keep only the first `max_rows` parsed records.
    ///
    /// Truncation happens after malformed lines are dropped, so the cap
    /// counts records, not raw lines.
    ///
    /// Default: `None` (no cap)
    pub max_rows: Option<usize>,
}

impl LoadConfig {
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_rows == Some(0) {
            return Err(ConfigError::ZeroMaxRows);
        }
        Ok(())
    }
}

/// How participant directories are recognised under a data directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Directory name prefix, e.g. `miner_` for `miner_17`.
    pub prefix: String,
    /// File name of the dataset inside each directory.
    pub data_file: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PARTICIPANT_PREFIX.to_string(),
            data_file: DEFAULT_DATA_FILE.to_string(),
        }
    }
}

impl DiscoveryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        if self.data_file.is_empty() {
            return Err(ConfigError::EmptyDataFile);
        }
        Ok(())
    }
}

/// Invalid loader or discovery settings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("max_rows must be >= 1 when set")]
    ZeroMaxRows,
    #[error("participant prefix must not be empty")]
    EmptyPrefix,
    #[error("data file name must not be empty")]
    EmptyDataFile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(LoadConfig::default().validate().is_ok());
        assert!(DiscoveryConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_max_rows_rejected() {
        let cfg = LoadConfig { max_rows: Some(0) };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroMaxRows));
    }

    #[test]
    fn empty_prefix_rejected() {
        let cfg = DiscoveryConfig {
            prefix: String::new(),
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyPrefix));
    }

    #[test]
    fn serde_fills_defaults() {
        let cfg: DiscoveryConfig = serde_json::from_str(r#"{"prefix":"team_"}"#).expect("parse");
        assert_eq!(cfg.prefix, "team_");
        assert_eq!(cfg.data_file, DEFAULT_DATA_FILE);
    }
}

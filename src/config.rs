//! YAML configuration file support for DSFP.
//!
//! One file configures every stage. Every section is optional and falls
//! back to the defaults below; CLI flags override whatever the file sets.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "round 12"
//!
//! ingest:
//!   max_rows: 250
//!   data_file: "data.jsonl"
//!   participant_prefix: "miner_"
//!
//! matcher:
//!   duplicate_threshold: 100
//!   strategy: greedy        # or: transitive
//!   use_parallel: false
//!
//! golden:
//!   min_usage_fraction: 0.5
//!   target_size: 250
//!   max_reused_golden: 80
//!   ensure_unique: true
//!   seed: 42
//!
//! logging:
//!   level: "info"
//!   json: false
//! ```

use std::fs;
use std::path::Path;

use ingest::{DiscoveryConfig, LoadConfig, DEFAULT_DATA_FILE, DEFAULT_PARTICIPANT_PREFIX};
use matcher::{ClusterStrategy, MatchConfig, DEFAULT_DUPLICATE_THRESHOLD};
use selector::{
    SelectorConfig, UniqueConfig, DEFAULT_FALLBACK_FACTOR, DEFAULT_MAX_REUSED_GOLDEN,
    DEFAULT_TARGET_SIZE,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DsfpConfig {
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub ingest: IngestYamlConfig,

    #[serde(default)]
    pub matcher: MatchYamlConfig,

    #[serde(default)]
    pub golden: GoldenYamlConfig,

    #[serde(default)]
    pub logging: LoggingYamlConfig,
}

impl DsfpConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: DsfpConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.ingest.validate()?;
        self.matcher.validate()?;
        self.golden.validate()?;
        Ok(())
    }

    pub fn load_config(&self) -> LoadConfig {
        LoadConfig {
            max_rows: self.ingest.max_rows,
        }
    }

    pub fn discovery_config(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            prefix: self.ingest.participant_prefix.clone(),
            data_file: self.ingest.data_file.clone(),
        }
    }

    pub fn match_config(&self) -> MatchConfig {
        MatchConfig {
            duplicate_threshold: self.matcher.duplicate_threshold,
            strategy: self.matcher.strategy,
            use_parallel: self.matcher.use_parallel,
        }
    }

    pub fn selector_config(&self) -> SelectorConfig {
        SelectorConfig {
            target_size: self.golden.target_size,
            max_reused_golden: self.golden.max_reused_golden,
            ensure_unique: self.golden.ensure_unique,
            seed: self.golden.seed,
            duplicate_threshold: self.matcher.duplicate_threshold,
        }
    }

    pub fn unique_config(&self) -> UniqueConfig {
        UniqueConfig {
            target_size: self.golden.target_size,
            duplicate_threshold: self.matcher.duplicate_threshold,
            seed: self.golden.seed,
            fallback_factor: DEFAULT_FALLBACK_FACTOR,
        }
    }
}

impl Default for DsfpConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            ingest: IngestYamlConfig::default(),
            matcher: MatchYamlConfig::default(),
            golden: GoldenYamlConfig::default(),
            logging: LoggingYamlConfig::default(),
        }
    }
}

/// Loader and participant discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestYamlConfig {
    /// Keep only the first N records of every dataset.
    #[serde(default)]
    pub max_rows: Option<usize>,

    #[serde(default = "default_data_file")]
    pub data_file: String,

    #[serde(default = "default_participant_prefix")]
    pub participant_prefix: String,
}

impl IngestYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.max_rows == Some(0) {
            return Err(ConfigLoadError::Validation(
                "ingest.max_rows must be >= 1".to_string(),
            ));
        }
        if self.participant_prefix.is_empty() {
            return Err(ConfigLoadError::Validation(
                "ingest.participant_prefix must not be empty".to_string(),
            ));
        }
        if self.data_file.is_empty() {
            return Err(ConfigLoadError::Validation(
                "ingest.data_file must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for IngestYamlConfig {
    fn default() -> Self {
        Self {
            max_rows: None,
            data_file: default_data_file(),
            participant_prefix: default_participant_prefix(),
        }
    }
}

/// Duplicate detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchYamlConfig {
    #[serde(default = "default_duplicate_threshold")]
    pub duplicate_threshold: usize,

    #[serde(default)]
    pub strategy: ClusterStrategy,

    #[serde(default)]
    pub use_parallel: bool,
}

impl MatchYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.duplicate_threshold == 0 {
            return Err(ConfigLoadError::Validation(
                "matcher.duplicate_threshold must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MatchYamlConfig {
    fn default() -> Self {
        Self {
            duplicate_threshold: default_duplicate_threshold(),
            strategy: ClusterStrategy::default(),
            use_parallel: false,
        }
    }
}

/// Golden analysis and selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldenYamlConfig {
    #[serde(default = "default_min_usage_fraction")]
    pub min_usage_fraction: f64,

    #[serde(default = "default_target_size")]
    pub target_size: usize,

    #[serde(default = "default_max_reused_golden")]
    pub max_reused_golden: usize,

    #[serde(default = "true_value")]
    pub ensure_unique: bool,

    #[serde(default)]
    pub seed: Option<u64>,
}

impl GoldenYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if !(0.0..=1.0).contains(&self.min_usage_fraction) {
            return Err(ConfigLoadError::Validation(
                "golden.min_usage_fraction must be within [0, 1]".to_string(),
            ));
        }
        if self.target_size == 0 {
            return Err(ConfigLoadError::Validation(
                "golden.target_size must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for GoldenYamlConfig {
    fn default() -> Self {
        Self {
            min_usage_fraction: default_min_usage_fraction(),
            target_size: default_target_size(),
            max_reused_golden: default_max_reused_golden(),
            ensure_unique: true,
            seed: None,
        }
    }
}

/// Log output settings for the `dsfp` binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingYamlConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingYamlConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Helper functions for serde defaults
fn true_value() -> bool {
    true
}

fn default_data_file() -> String {
    DEFAULT_DATA_FILE.to_string()
}

fn default_participant_prefix() -> String {
    DEFAULT_PARTICIPANT_PREFIX.to_string()
}

fn default_duplicate_threshold() -> usize {
    DEFAULT_DUPLICATE_THRESHOLD
}

fn default_min_usage_fraction() -> f64 {
    index::DEFAULT_MIN_USAGE_FRACTION
}

fn default_target_size() -> usize {
    DEFAULT_TARGET_SIZE
}

fn default_max_reused_golden() -> usize {
    DEFAULT_MAX_REUSED_GOLDEN
}

fn default_log_level() -> String {
    "info".to_string()
}

use matcher::DEFAULT_DUPLICATE_THRESHOLD;
use serde::{Deserialize, Serialize};

use crate::error::SelectorError;

/// Records a submission is scored on.
pub const DEFAULT_TARGET_SIZE: usize = 250;

/// Cap on golden entries already present in some participant's dataset.
pub const DEFAULT_MAX_REUSED_GOLDEN: usize = 80;

/// How many used candidates per missing slot the unique fallback examines.
pub const DEFAULT_FALLBACK_FACTOR: usize = 10;

/// Configuration for [`select_golden`](crate::select_golden).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SelectorConfig {
    pub target_size: usize,
    pub max_reused_golden: usize,
    /// Keep records already used by participants out of the random fill.
    ///
    /// Golden entries are classified as fresh or reused regardless.
    pub ensure_unique: bool,
    /// Seed for the random fill. `None` draws one; the seed actually used
    /// is reported on the [`Selection`](crate::Selection).
    pub seed: Option<u64>,
    /// Overlap with any participant above which the result is flagged.
    pub duplicate_threshold: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_TARGET_SIZE,
            max_reused_golden: DEFAULT_MAX_REUSED_GOLDEN,
            ensure_unique: true,
            seed: None,
            duplicate_threshold: DEFAULT_DUPLICATE_THRESHOLD,
        }
    }
}

impl SelectorConfig {
    pub fn with_target_size(mut self, target_size: usize) -> Self {
        self.target_size = target_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_reused_golden(mut self, max_reused_golden: usize) -> Self {
        self.max_reused_golden = max_reused_golden;
        self
    }

    pub fn validate(&self) -> Result<(), SelectorError> {
        if self.target_size == 0 {
            return Err(SelectorError::InvalidConfig(
                "target_size must be greater than zero".into(),
            ));
        }
        if self.duplicate_threshold == 0 {
            return Err(SelectorError::InvalidConfig(
                "duplicate_threshold must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration for [`select_unique`](crate::select_unique).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UniqueConfig {
    pub target_size: usize,
    /// Maximum overlap allowed with any single participant.
    pub duplicate_threshold: usize,
    pub seed: Option<u64>,
    pub fallback_factor: usize,
}

impl Default for UniqueConfig {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_TARGET_SIZE,
            duplicate_threshold: DEFAULT_DUPLICATE_THRESHOLD,
            seed: None,
            fallback_factor: DEFAULT_FALLBACK_FACTOR,
        }
    }
}

impl UniqueConfig {
    pub fn validate(&self) -> Result<(), SelectorError> {
        if self.target_size == 0 {
            return Err(SelectorError::InvalidConfig(
                "target_size must be greater than zero".into(),
            ));
        }
        if self.duplicate_threshold == 0 {
            return Err(SelectorError::InvalidConfig(
                "duplicate_threshold must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| fastrand::u64(..))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = SelectorConfig::default();
        assert_eq!(cfg.target_size, 250);
        assert_eq!(cfg.max_reused_golden, 80);
        assert!(cfg.ensure_unique);
        assert_eq!(cfg.seed, None);
        assert!(cfg.validate().is_ok());
        assert!(UniqueConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_target_rejected() {
        let err = SelectorConfig::default()
            .with_target_size(0)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("target_size"));

        let unique = UniqueConfig {
            target_size: 0,
            ..Default::default()
        };
        assert!(unique.validate().is_err());
    }

    #[test]
    fn zero_threshold_rejected_everywhere() {
        let selector = SelectorConfig {
            duplicate_threshold: 0,
            ..Default::default()
        };
        assert!(selector.validate().is_err());

        let unique = UniqueConfig {
            duplicate_threshold: 0,
            ..Default::default()
        };
        let err = unique.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate_threshold"));
    }

    #[test]
    fn explicit_seed_is_kept() {
        assert_eq!(resolve_seed(Some(7)), 7);
    }
}

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Overlap count above which two collections are treated as duplicates.
pub const DEFAULT_DUPLICATE_THRESHOLD: usize = 100;

/// How collections are grouped once their pairwise overlaps are known.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClusterStrategy {
    /// Seed-only comparison in sorted id order.
    ///
    /// For each unprocessed seed, every other unprocessed id whose overlap
    /// with the seed exceeds the threshold joins the seed's cluster. Not a
    /// transitive closure: A~B and B~C with A and C apart yields `{A,B}, {C}`.
    #[default]
    Greedy,
    /// Connected components of the "overlap exceeds threshold" relation.
    Transitive,
}

impl ClusterStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterStrategy::Greedy => "greedy",
            ClusterStrategy::Transitive => "transitive",
        }
    }
}

/// Tuning knobs for the duplicate-detection stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MatchConfig {
    /// Overlap count that must be strictly exceeded for two collections to
    /// pair up, and reached for a reference check to flag a major duplicate.
    ///
    /// Default: `100`
    pub duplicate_threshold: usize,
    pub strategy: ClusterStrategy,
    /// Compute the similarity matrix on the rayon pool.
    pub use_parallel: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            duplicate_threshold: DEFAULT_DUPLICATE_THRESHOLD,
            strategy: ClusterStrategy::default(),
            use_parallel: false,
        }
    }
}

impl MatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, duplicate_threshold: usize) -> Self {
        self.duplicate_threshold = duplicate_threshold;
        self
    }

    pub fn with_strategy(mut self, strategy: ClusterStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if self.duplicate_threshold == 0 {
            return Err(MatchError::InvalidConfig(
                "duplicate_threshold must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// A group of collection ids produced by [`cluster`](crate::cluster).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateCluster {
    /// Member ids, sorted. The first one is the seed for greedy clustering.
    pub members: Vec<String>,
}

impl DuplicateCluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// True for clusters with more than one member.
    pub fn is_duplicate(&self) -> bool {
        self.members.len() > 1
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.iter().any(|m| m == id)
    }
}

/// Headline numbers over a clustering result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClusterSummary {
    pub total: usize,
    /// One per cluster: each group counts as a single dataset.
    pub unique_datasets: usize,
    /// Members beyond the first in every duplicate group.
    pub duplicated_participants: usize,
    pub duplicate_groups: usize,
}

impl ClusterSummary {
    pub fn from_clusters(clusters: &[DuplicateCluster]) -> Self {
        let total: usize = clusters.iter().map(DuplicateCluster::len).sum();
        let duplicated_participants: usize = clusters
            .iter()
            .filter(|c| c.is_duplicate())
            .map(|c| c.len() - 1)
            .sum();
        Self {
            total,
            unique_datasets: total - duplicated_participants,
            duplicated_participants,
            duplicate_groups: clusters.iter().filter(|c| c.is_duplicate()).count(),
        }
    }
}

/// Errors produced by the matching layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MatchError {
    #[error("invalid match config: {0}")]
    InvalidConfig(String),
    /// Two collections share an id, so pairwise results would be ambiguous.
    #[error("duplicate collection id: {0}")]
    DuplicateId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(ids: &[&str]) -> DuplicateCluster {
        DuplicateCluster {
            members: ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn default_config_is_valid_and_greedy() {
        let cfg = MatchConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.strategy, ClusterStrategy::Greedy);
        assert_eq!(cfg.duplicate_threshold, 100);
        assert!(!cfg.use_parallel);
    }

    #[test]
    fn zero_threshold_rejected() {
        let err = MatchConfig::new()
            .with_threshold(0)
            .validate()
            .expect_err("config should be invalid");
        match err {
            MatchError::InvalidConfig(msg) => assert!(msg.contains("duplicate_threshold")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn strategy_deserializes_lowercase() {
        let cfg: MatchConfig =
            serde_yaml::from_str("strategy: transitive\nuse_parallel: true\n").expect("parse");
        assert_eq!(cfg.strategy, ClusterStrategy::Transitive);
        assert!(cfg.use_parallel);
        assert_eq!(cfg.duplicate_threshold, DEFAULT_DUPLICATE_THRESHOLD);
    }

    #[test]
    fn summary_counts_groups_and_extras() {
        let clusters = vec![cluster(&["a", "b", "c"]), cluster(&["d"]), cluster(&["e", "f"])];
        let summary = ClusterSummary::from_clusters(&clusters);
        assert_eq!(
            summary,
            ClusterSummary {
                total: 6,
                unique_datasets: 3,
                duplicated_participants: 3,
                duplicate_groups: 2,
            }
        );
    }
}

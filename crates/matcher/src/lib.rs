//! # Dataset Matcher (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` sits on top of the ingest and index layers. It answers "how much
//! do these datasets share?" using exact record equality on fingerprints, and
//! turns the answers into duplicate clusters, reference conformance verdicts
//! and participant profiles.
//!
//! ## Core Types
//!
//! - [`overlap_count`]: distinct records shared by two collections.
//! - [`SimilarityMatrix`]: every pairwise overlap, optionally on rayon.
//! - [`cluster`] / [`ClusterStrategy`]: threshold grouping, greedy (seed-only)
//!   or transitive (union-find).
//! - [`check_against_reference`]: [`ConformanceStatus`] of a collection
//!   versus the reference set.
//! - [`analyze_participants`] / [`compare_own`]: content-hash groups,
//!   position ranges, and overlap of an outside collection with the set.
//!
//! ## Example Usage
//!
//! ```
//! use ingest::Collection;
//! use matcher::{cluster, ClusterStrategy, ClusterSummary};
//! use serde_json::json;
//!
//! let rows = |r: std::ops::Range<i32>| r.map(|i| json!({ "id": i })).collect::<Vec<_>>();
//! let collections = vec![
//!     Collection::from_records("miner_1", rows(0..150)),
//!     Collection::from_records("miner_2", rows(20..170)),
//!     Collection::from_records("miner_3", rows(500..650)),
//! ];
//!
//! let clusters = cluster(&collections, 100, ClusterStrategy::Greedy).unwrap();
//! assert_eq!(clusters.len(), 2);
//! assert!(clusters[0].is_duplicate());
//!
//! let summary = ClusterSummary::from_clusters(&clusters);
//! assert_eq!(summary.duplicated_participants, 1);
//! ```

pub mod analysis;
pub mod cluster;
pub mod conformance;
pub mod engine;
pub mod types;

pub use crate::analysis::{
    analyze_participants, compare_own, HashGroup, OwnComparison, ParticipantAnalysis,
    PositionProfile, RangeStats,
};
pub use crate::cluster::{cluster, cluster_matrix};
pub use crate::conformance::{
    check_against_reference, ConformanceCheck, ConformanceStatus, ConformanceSummary,
    HIGH_SIMILARITY_MIN,
};
pub use crate::engine::{content_hash, overlap_count, positions_in_reference, SimilarityMatrix};
pub use crate::types::{
    ClusterStrategy, ClusterSummary, DuplicateCluster, MatchConfig, MatchError,
    DEFAULT_DUPLICATE_THRESHOLD,
};

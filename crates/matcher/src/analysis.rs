//! How a set of participants draws on the reference set.
//!
//! Groups participants by identical content, profiles the reference
//! positions each one uses, and compares an outside collection (typically
//! one's own submission) against the analyzed set.

use std::collections::BTreeMap;

use canonical::ContentHash;
use index::ReferenceIndex;
use ingest::Collection;
use serde::Serialize;

/// Participants whose collections have the same content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HashGroup {
    pub hash: ContentHash,
    pub members: Vec<String>,
}

/// The reference positions one participant uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionProfile {
    pub id: String,
    pub hash: ContentHash,
    /// Sorted, duplicate-free.
    pub positions: Vec<usize>,
}

impl PositionProfile {
    pub fn first(&self) -> Option<usize> {
        self.positions.first().copied()
    }

    pub fn last(&self) -> Option<usize> {
        self.positions.last().copied()
    }

    /// True when the positions form one unbroken run.
    pub fn is_contiguous(&self) -> bool {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => last - first + 1 == self.positions.len(),
            _ => false,
        }
    }
}

/// Spread of the first and last positions across profiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeStats {
    pub min_first: usize,
    pub max_first: usize,
    pub min_last: usize,
    pub max_last: usize,
    pub avg_first: f64,
    pub avg_last: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticipantAnalysis {
    /// Largest group first, then by hash.
    pub hash_groups: Vec<HashGroup>,
    /// One per participant, in id order.
    pub profiles: Vec<PositionProfile>,
}

impl ParticipantAnalysis {
    pub fn participants(&self) -> usize {
        self.profiles.len()
    }

    pub fn unique_hashes(&self) -> usize {
        self.hash_groups.len()
    }

    pub fn most_common(&self) -> Option<&HashGroup> {
        self.hash_groups.first()
    }

    pub fn contiguous_count(&self) -> usize {
        self.profiles.iter().filter(|p| p.is_contiguous()).count()
    }

    /// `None` when no participant uses any reference record.
    pub fn range_stats(&self) -> Option<RangeStats> {
        let spans: Vec<(usize, usize)> = self
            .profiles
            .iter()
            .filter_map(|p| Some((p.first()?, p.last()?)))
            .collect();
        if spans.is_empty() {
            return None;
        }
        let n = spans.len() as f64;
        Some(RangeStats {
            min_first: spans.iter().map(|s| s.0).min()?,
            max_first: spans.iter().map(|s| s.0).max()?,
            min_last: spans.iter().map(|s| s.1).min()?,
            max_last: spans.iter().map(|s| s.1).max()?,
            avg_first: spans.iter().map(|s| s.0 as f64).sum::<f64>() / n,
            avg_last: spans.iter().map(|s| s.1 as f64).sum::<f64>() / n,
        })
    }
}

/// Profile every collection against the reference index.
pub fn analyze_participants(
    collections: &[Collection],
    index: &ReferenceIndex,
) -> ParticipantAnalysis {
    let mut profiles: Vec<PositionProfile> = collections
        .iter()
        .map(|c| PositionProfile {
            id: c.id().to_string(),
            hash: c.content_hash(),
            positions: index.positions_in(c),
        })
        .collect();
    profiles.sort_by(|a, b| a.id.cmp(&b.id));

    let mut by_hash: BTreeMap<ContentHash, Vec<String>> = BTreeMap::new();
    for profile in &profiles {
        by_hash
            .entry(profile.hash.clone())
            .or_default()
            .push(profile.id.clone());
    }
    let mut hash_groups: Vec<HashGroup> = by_hash
        .into_iter()
        .map(|(hash, members)| HashGroup { hash, members })
        .collect();
    hash_groups.sort_by(|a, b| {
        b.members
            .len()
            .cmp(&a.members.len())
            .then_with(|| a.hash.cmp(&b.hash))
    });

    ParticipantAnalysis {
        hash_groups,
        profiles,
    }
}

/// An outside collection measured against an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnComparison {
    pub id: String,
    /// Analyzed participants with exactly the same content.
    pub hash_matches: Vec<String>,
    /// `(participant, shared reference positions)`, largest first; zero
    /// overlaps are omitted.
    pub overlaps: Vec<(String, usize)>,
}

impl OwnComparison {
    pub fn max_overlap(&self) -> Option<usize> {
        self.overlaps.first().map(|(_, n)| *n)
    }
}

/// Compare `own` with every analyzed participant.
pub fn compare_own(
    own: &Collection,
    analysis: &ParticipantAnalysis,
    index: &ReferenceIndex,
) -> OwnComparison {
    let hash = own.content_hash();
    let positions = index.positions_in(own);

    let hash_matches = analysis
        .profiles
        .iter()
        .filter(|p| p.hash == hash)
        .map(|p| p.id.clone())
        .collect();

    let mut overlaps: Vec<(String, usize)> = analysis
        .profiles
        .iter()
        .map(|p| (p.id.clone(), sorted_intersection(&positions, &p.positions)))
        .filter(|(_, n)| *n > 0)
        .collect();
    overlaps.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    OwnComparison {
        id: own.id().to_string(),
        hash_matches,
        overlaps,
    }
}

fn sorted_intersection(a: &[usize], b: &[usize]) -> usize {
    let (mut i, mut j, mut n) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                n += 1;
                i += 1;
                j += 1;
            }
        }
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn records(positions: impl IntoIterator<Item = usize>) -> Vec<Value> {
        positions.into_iter().map(|i| json!({ "q": i })).collect()
    }

    fn setup() -> (ReferenceIndex, Vec<Collection>) {
        let reference = Collection::from_records("reference", records(0..100));
        let index = ReferenceIndex::build(&reference);
        let collections = vec![
            Collection::from_records("miner_3", records([10, 11, 12])),
            Collection::from_records("miner_1", records(0..5)),
            Collection::from_records("miner_2", records([4, 3, 2, 1, 0])),
            Collection::from_records("miner_4", vec![json!("off-reference")]),
        ];
        (index, collections)
    }

    #[test]
    fn groups_identical_content() {
        let (index, collections) = setup();
        let analysis = analyze_participants(&collections, &index);
        assert_eq!(analysis.participants(), 4);
        assert_eq!(analysis.unique_hashes(), 3);
        let top = analysis.most_common().unwrap();
        assert_eq!(top.members, vec!["miner_1", "miner_2"]);
    }

    #[test]
    fn contiguity_and_ranges() {
        let (index, collections) = setup();
        let analysis = analyze_participants(&collections, &index);
        assert_eq!(analysis.contiguous_count(), 3);

        let stats = analysis.range_stats().unwrap();
        assert_eq!((stats.min_first, stats.max_first), (0, 10));
        assert_eq!((stats.min_last, stats.max_last), (4, 12));
        assert!((stats.avg_first - 10.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn gap_breaks_contiguity() {
        let profile = PositionProfile {
            id: "x".into(),
            hash: canonical::content_hash(&[]),
            positions: vec![1, 2, 4],
        };
        assert!(!profile.is_contiguous());
    }

    #[test]
    fn compare_own_reports_hash_matches_and_overlaps() {
        let (index, collections) = setup();
        let analysis = analyze_participants(&collections, &index);

        let own = Collection::from_records("mine", records([0, 1, 2, 3, 4]));
        let cmp = compare_own(&own, &analysis, &index);
        assert_eq!(cmp.hash_matches, vec!["miner_1", "miner_2"]);
        assert_eq!(
            cmp.overlaps,
            vec![("miner_1".to_string(), 5), ("miner_2".to_string(), 5)]
        );

        let fresh = Collection::from_records("fresh", records([50, 51, 11]));
        let cmp = compare_own(&fresh, &analysis, &index);
        assert!(cmp.hash_matches.is_empty());
        assert_eq!(cmp.max_overlap(), Some(1));
    }
}

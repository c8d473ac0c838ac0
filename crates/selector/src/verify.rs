use ingest::Collection;
use matcher::overlap_count;
use serde::Serialize;
use tracing::{info, warn};

/// How a finished selection overlaps the existing participants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OverlapVerification {
    pub max_overlap: usize,
    /// Participant with the largest overlap; first in id order on ties.
    pub most_similar: Option<String>,
    /// Participants whose overlap exceeds the threshold, largest first.
    pub violations: Vec<(String, usize)>,
}

impl OverlapVerification {
    pub fn passes(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Measure `selected` against every participant.
///
/// Passing means no overlap strictly above `threshold`, the same rule
/// clustering uses to pair two datasets.
pub fn verify_overlap(
    selected: &Collection,
    participants: &[Collection],
    threshold: usize,
) -> OverlapVerification {
    let mut ordered: Vec<&Collection> = participants.iter().collect();
    ordered.sort_by(|a, b| a.id().cmp(b.id()));

    let mut result = OverlapVerification::default();
    for participant in ordered {
        let overlap = overlap_count(selected, participant);
        if overlap > result.max_overlap {
            result.max_overlap = overlap;
            result.most_similar = Some(participant.id().to_string());
        }
        if overlap > threshold {
            result.violations.push((participant.id().to_string(), overlap));
        }
    }
    result
        .violations
        .sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    if result.passes() {
        info!(
            max_overlap = result.max_overlap,
            most_similar = ?result.most_similar,
            threshold,
            "overlap_verified"
        );
    } else {
        warn!(
            max_overlap = result.max_overlap,
            violations = result.violations.len(),
            threshold,
            "overlap_violation"
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collection(id: &str, range: std::ops::Range<i32>) -> Collection {
        Collection::from_records(id, range.map(|i| json!({ "n": i })).collect())
    }

    #[test]
    fn reports_max_and_violations() {
        let selected = collection("mine", 0..200);
        let participants = vec![
            collection("miner_c", 150..400),
            collection("miner_a", 0..120),
            collection("miner_b", 500..600),
            collection("miner_d", 0..101),
        ];
        let result = verify_overlap(&selected, &participants, 100);
        assert_eq!(result.max_overlap, 120);
        assert_eq!(result.most_similar.as_deref(), Some("miner_a"));
        assert_eq!(
            result.violations,
            vec![("miner_a".to_string(), 120), ("miner_d".to_string(), 101)]
        );
        assert!(!result.passes());
    }

    #[test]
    fn overlap_at_threshold_passes() {
        let selected = collection("mine", 0..100);
        let result = verify_overlap(&selected, &[collection("miner_1", 0..100)], 100);
        assert!(result.passes());
        assert_eq!(result.max_overlap, 100);
    }

    #[test]
    fn no_participants_no_similarity() {
        let result = verify_overlap(&collection("mine", 0..5), &[], 100);
        assert_eq!(result.max_overlap, 0);
        assert_eq!(result.most_similar, None);
    }
}

//! Checks of participant collections against the reference set.

use std::fmt;

use ingest::Collection;
use serde::Serialize;

use crate::engine::overlap_count;

/// Shared-record count at which a collection is reported as highly similar.
pub const HIGH_SIMILARITY_MIN: usize = 50;

/// Share of records, in percent, above which a collection is suspicious.
pub const SUSPICIOUS_PCT: f64 = 50.0;

/// Verdict for one collection, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConformanceStatus {
    Empty,
    /// Every record is in the reference set.
    CompleteDuplicate,
    /// Shares at least `duplicate_threshold` records with the reference.
    MajorDuplicate,
    /// Shares at least [`HIGH_SIMILARITY_MIN`] records.
    HighSimilarity,
    SomeOverlap,
    NoOverlap,
}

impl fmt::Display for ConformanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConformanceStatus::Empty => "EMPTY",
            ConformanceStatus::CompleteDuplicate => "COMPLETE DUPLICATE",
            ConformanceStatus::MajorDuplicate => "MAJOR DUPLICATE",
            ConformanceStatus::HighSimilarity => "HIGH SIMILARITY",
            ConformanceStatus::SomeOverlap => "SOME OVERLAP",
            ConformanceStatus::NoOverlap => "NO OVERLAP",
        };
        f.pad(label)
    }
}

/// Result of comparing one collection with the reference set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConformanceCheck {
    pub id: String,
    pub total_records: usize,
    /// Distinct records also present in the reference.
    pub shared_records: usize,
    /// `shared_records` relative to `total_records`, in percent.
    pub match_pct: f64,
    pub complete_duplicate: bool,
    pub major_duplicate: bool,
    pub suspicious: bool,
    pub status: ConformanceStatus,
}

impl ConformanceCheck {
    /// True when every record of the collection comes from the reference.
    pub fn within_reference(&self) -> bool {
        self.shared_records == self.total_records
    }
}

/// Compare `collection` against `reference`.
pub fn check_against_reference(
    collection: &Collection,
    reference: &Collection,
    duplicate_threshold: usize,
) -> ConformanceCheck {
    let total_records = collection.len();
    let shared_records = overlap_count(collection, reference);
    let match_pct = if total_records == 0 {
        0.0
    } else {
        shared_records as f64 * 100.0 / total_records as f64
    };

    let complete_duplicate = total_records > 0 && shared_records == total_records;
    let major_duplicate = shared_records >= duplicate_threshold;
    let status = if total_records == 0 {
        ConformanceStatus::Empty
    } else if complete_duplicate {
        ConformanceStatus::CompleteDuplicate
    } else if major_duplicate {
        ConformanceStatus::MajorDuplicate
    } else if shared_records >= HIGH_SIMILARITY_MIN {
        ConformanceStatus::HighSimilarity
    } else if shared_records > 0 {
        ConformanceStatus::SomeOverlap
    } else {
        ConformanceStatus::NoOverlap
    };

    ConformanceCheck {
        id: collection.id().to_string(),
        total_records,
        shared_records,
        match_pct,
        complete_duplicate,
        major_duplicate,
        suspicious: match_pct >= SUSPICIOUS_PCT,
        status,
    }
}

/// Counts over a batch of checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConformanceSummary {
    pub checked: usize,
    pub complete_duplicates: usize,
    pub major_duplicates: usize,
    pub suspicious: usize,
    pub no_overlap: usize,
    /// Collections holding at least one record absent from the reference.
    pub outside_reference: usize,
}

impl ConformanceSummary {
    pub fn from_checks(checks: &[ConformanceCheck]) -> Self {
        let count = |pred: fn(&ConformanceCheck) -> bool| checks.iter().filter(|c| pred(c)).count();
        Self {
            checked: checks.len(),
            complete_duplicates: count(|c| c.complete_duplicate),
            major_duplicates: count(|c| c.major_duplicate),
            suspicious: count(|c| c.suspicious),
            no_overlap: count(|c| c.shared_records == 0),
            outside_reference: count(|c| !c.within_reference()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reference() -> Collection {
        Collection::from_records("reference", (0..300).map(|i| json!({ "id": i })).collect())
    }

    fn participant(id: &str, from_ref: std::ops::Range<i64>, foreign: usize) -> Collection {
        let mut records: Vec<_> = from_ref.map(|i| json!({ "id": i })).collect();
        records.extend((0..foreign).map(|i| json!({ "foreign": i })));
        Collection::from_records(id, records)
    }

    #[test]
    fn status_ladder() {
        let reference = reference();
        let cases = [
            (participant("e", 0..0, 0), ConformanceStatus::Empty),
            (participant("c", 0..10, 0), ConformanceStatus::CompleteDuplicate),
            (participant("m", 0..120, 5), ConformanceStatus::MajorDuplicate),
            (participant("h", 0..60, 100), ConformanceStatus::HighSimilarity),
            (participant("s", 0..3, 100), ConformanceStatus::SomeOverlap),
            (participant("n", 0..0, 4), ConformanceStatus::NoOverlap),
        ];
        for (collection, expected) in cases {
            let check = check_against_reference(&collection, &reference, 100);
            assert_eq!(check.status, expected, "collection {}", check.id);
        }
    }

    #[test]
    fn major_threshold_is_inclusive() {
        let check = check_against_reference(&participant("m", 0..100, 1), &reference(), 100);
        assert!(check.major_duplicate);
        assert_eq!(check.status, ConformanceStatus::MajorDuplicate);
    }

    #[test]
    fn suspicious_uses_percentage() {
        let check = check_against_reference(&participant("h", 0..5, 5), &reference(), 100);
        assert!((check.match_pct - 50.0).abs() < 1e-9);
        assert!(check.suspicious);
        assert!(!check.within_reference());
    }

    #[test]
    fn summary_counts() {
        let reference = reference();
        let checks: Vec<_> = [
            participant("a", 0..150, 0),
            participant("b", 0..0, 3),
            participant("c", 0..120, 30),
        ]
        .iter()
        .map(|c| check_against_reference(c, &reference, 100))
        .collect();
        let summary = ConformanceSummary::from_checks(&checks);
        assert_eq!(summary.checked, 3);
        assert_eq!(summary.complete_duplicates, 1);
        assert_eq!(summary.major_duplicates, 2);
        assert_eq!(summary.suspicious, 2);
        assert_eq!(summary.no_overlap, 1);
        assert_eq!(summary.outside_reference, 2);
    }

    #[test]
    fn status_labels_pad() {
        assert_eq!(format!("{:<12}|", ConformanceStatus::NoOverlap), "NO OVERLAP  |");
    }
}

//! Usage-frequency analysis over the reference set.
//!
//! For every reference position we count how many analyzed collections
//! contain the record stored there. A collection contributes at most one to
//! a position, however often it repeats the record.

use std::time::Instant;

use ingest::Collection;
use serde::Serialize;
use tracing::debug;

use crate::error::IndexError;
use crate::reference::ReferenceIndex;

/// Absorbs float artefacts such as `0.7 * 10.0 == 7.000000000000001`.
const CEIL_TOLERANCE: f64 = 1e-9;

/// Default fraction of analyzed collections a golden entry must appear in.
pub const DEFAULT_MIN_USAGE_FRACTION: f64 = 0.5;

/// A reference position together with how widely it is reused.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GoldenEntry {
    pub position: usize,
    pub count: usize,
    /// `count` as a percentage of the analyzed collections.
    pub usage_pct: f64,
}

/// Per-position usage counts.
#[derive(Debug, Clone, Default)]
pub struct UsageFrequency {
    counts: Vec<usize>,
    analyzed_count: usize,
}

/// Count, for each reference position, the collections that contain it.
pub fn analyze_usage<'a, I>(index: &ReferenceIndex, collections: I) -> UsageFrequency
where
    I: IntoIterator<Item = &'a Collection>,
{
    let start = Instant::now();
    let mut counts = vec![0usize; index.reference_len()];
    let mut analyzed_count = 0usize;

    for collection in collections {
        analyzed_count += 1;
        for pos in index.positions_in(collection) {
            counts[pos] += 1;
        }
    }

    let usage = UsageFrequency {
        counts,
        analyzed_count,
    };
    debug!(
        analyzed_count,
        positions_used = usage.positions_used(),
        elapsed_micros = start.elapsed().as_micros(),
        "usage_analyzed"
    );
    usage
}

impl UsageFrequency {
    /// Number of collections that were analyzed.
    pub fn analyzed_count(&self) -> usize {
        self.analyzed_count
    }

    /// Usage count at `position`; `0` for unknown positions.
    pub fn count(&self, position: usize) -> usize {
        self.counts.get(position).copied().unwrap_or(0)
    }

    /// Number of reference positions used by at least one collection.
    pub fn positions_used(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    /// Minimum count a position needs to be golden at `fraction`.
    pub fn min_count(&self, fraction: f64) -> Result<usize, IndexError> {
        validate_fraction(fraction)?;
        let raw = fraction * self.analyzed_count as f64 - CEIL_TOLERANCE;
        Ok(raw.ceil().max(0.0) as usize)
    }

    /// Positions used by at least `ceil(fraction * analyzed_count)` collections.
    ///
    /// Only positions with a count of at least one qualify, so a fraction of
    /// `0.0` yields every used position rather than the whole reference.
    /// Ordered by count descending, then position ascending.
    pub fn golden_entries(&self, fraction: f64) -> Result<Vec<GoldenEntry>, IndexError> {
        let min_count = self.min_count(fraction)?.max(1);
        let mut entries: Vec<GoldenEntry> = self
            .counts
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count >= min_count)
            .map(|(position, &count)| self.entry(position, count))
            .collect();
        sort_entries(&mut entries);
        Ok(entries)
    }

    /// The `n` most used positions, same ordering as [`golden_entries`](Self::golden_entries).
    pub fn most_used(&self, n: usize) -> Vec<GoldenEntry> {
        let mut entries: Vec<GoldenEntry> = self
            .counts
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count > 0)
            .map(|(position, &count)| self.entry(position, count))
            .collect();
        sort_entries(&mut entries);
        entries.truncate(n);
        entries
    }

    fn entry(&self, position: usize, count: usize) -> GoldenEntry {
        let usage_pct = if self.analyzed_count == 0 {
            0.0
        } else {
            count as f64 * 100.0 / self.analyzed_count as f64
        };
        GoldenEntry {
            position,
            count,
            usage_pct,
        }
    }
}

fn sort_entries(entries: &mut [GoldenEntry]) {
    entries.sort_by(|a, b| b.count.cmp(&a.count).then(a.position.cmp(&b.position)));
}

fn validate_fraction(fraction: f64) -> Result<(), IndexError> {
    if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
        return Err(IndexError::InvalidFraction(fraction));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn reference(n: usize) -> Collection {
        Collection::from_records("ref", (0..n).map(|i| json!({ "id": i })).collect())
    }

    fn participant(id: &str, positions: &[usize]) -> Collection {
        let records: Vec<Value> = positions.iter().map(|&i| json!({ "id": i })).collect();
        Collection::from_records(id, records)
    }

    #[test]
    fn golden_boundary_at_half() {
        let reference = reference(20);
        let index = ReferenceIndex::build(&reference);
        let collections: Vec<Collection> = (0..10)
            .map(|i| {
                if i < 5 {
                    participant(&format!("miner_{i}"), &[5, 6])
                } else {
                    participant(&format!("miner_{i}"), &[6])
                }
            })
            .collect();

        let usage = analyze_usage(&index, &collections);
        assert_eq!(usage.analyzed_count(), 10);
        assert_eq!(usage.count(5), 5);

        let at_half: Vec<usize> = usage
            .golden_entries(0.5)
            .unwrap()
            .iter()
            .map(|e| e.position)
            .collect();
        assert_eq!(at_half, vec![6, 5]);

        let at_sixty: Vec<usize> = usage
            .golden_entries(0.6)
            .unwrap()
            .iter()
            .map(|e| e.position)
            .collect();
        assert_eq!(at_sixty, vec![6]);
    }

    #[test]
    fn repeated_records_count_once_per_collection() {
        let reference = reference(3);
        let index = ReferenceIndex::build(&reference);
        let c = participant("miner_1", &[1, 1, 1]);
        let usage = analyze_usage(&index, [&c]);
        assert_eq!(usage.count(1), 1);
    }

    #[test]
    fn float_artifact_does_not_raise_threshold() {
        let usage = UsageFrequency {
            counts: vec![7, 6],
            analyzed_count: 10,
        };
        assert_eq!(usage.min_count(0.7).unwrap(), 7);
        let golden = usage.golden_entries(0.7).unwrap();
        assert_eq!(golden.len(), 1);
        assert_eq!(golden[0].position, 0);
        assert!((golden[0].usage_pct - 70.0).abs() < 1e-9);
    }

    #[test]
    fn zero_fraction_only_returns_used_positions() {
        let usage = UsageFrequency {
            counts: vec![0, 2, 0, 1],
            analyzed_count: 2,
        };
        let positions: Vec<usize> = usage
            .golden_entries(0.0)
            .unwrap()
            .iter()
            .map(|e| e.position)
            .collect();
        assert_eq!(positions, vec![1, 3]);
    }

    #[test]
    fn fraction_out_of_range_rejected() {
        let usage = UsageFrequency::default();
        assert!(matches!(
            usage.golden_entries(1.5),
            Err(IndexError::InvalidFraction(_))
        ));
        assert!(usage.golden_entries(f64::NAN).is_err());
    }

    #[test]
    fn most_used_orders_by_count_then_position() {
        let usage = UsageFrequency {
            counts: vec![1, 3, 3, 0, 2],
            analyzed_count: 3,
        };
        let top: Vec<(usize, usize)> = usage
            .most_used(3)
            .iter()
            .map(|e| (e.position, e.count))
            .collect();
        assert_eq!(top, vec![(1, 3), (2, 3), (4, 2)]);
    }

    #[test]
    fn no_collections_no_golden() {
        let reference = reference(5);
        let index = ReferenceIndex::build(&reference);
        let usage = analyze_usage(&index, std::iter::empty::<&Collection>());
        assert!(usage.golden_entries(0.5).unwrap().is_empty());
    }
}

//! Selection of reference records nobody has submitted yet.

use canonical::Fingerprint;
use hashbrown::HashSet;
use index::UsedEntries;
use ingest::{Collection, Record};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{resolve_seed, UniqueConfig};
use crate::error::SelectorError;

/// Outcome of [`select_unique`].
#[derive(Debug, Clone, Serialize)]
pub struct UniqueSelection {
    /// Selected records, sorted by fingerprint.
    pub records: Vec<Record>,
    /// Distinct reference records no participant uses.
    pub unused_available: usize,
    pub from_unused: usize,
    /// Used records accepted by the overlap-bounded fallback.
    pub from_fallback: usize,
    pub candidates_tried: usize,
    pub shortfall: usize,
    pub seed: u64,
}

impl UniqueSelection {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Pick `target_size` reference records that keep clear of every participant.
///
/// Completely unused records are sampled first. If there are not enough, used
/// records are tried in reference order, at most `fallback_factor` per
/// missing slot, and one is accepted only while the overlap with every single
/// participant stays within `duplicate_threshold`.
pub fn select_unique(
    reference: &Collection,
    participants: &[Collection],
    cfg: &UniqueConfig,
) -> Result<UniqueSelection, SelectorError> {
    cfg.validate()?;
    let seed = resolve_seed(cfg.seed);
    let used = UsedEntries::from_collections(participants);

    let mut seen: HashSet<&Fingerprint> = HashSet::new();
    let (mut unused, used_candidates): (Vec<usize>, Vec<usize>) = (0..reference.len())
        .filter(|&pos| seen.insert(&reference.fingerprints()[pos]))
        .partition(|&pos| !used.contains(&reference.fingerprints()[pos]));
    let unused_available = unused.len();

    if unused.len() > cfg.target_size {
        let mut rng = fastrand::Rng::with_seed(seed);
        rng.shuffle(&mut unused);
        unused.truncate(cfg.target_size);
    }
    let mut selected = unused;
    let from_unused = selected.len();

    let mut candidates_tried = 0;
    let mut from_fallback = 0;
    if selected.len() < cfg.target_size {
        let remaining = cfg.target_size - selected.len();
        let budget = remaining.saturating_mul(cfg.fallback_factor);
        // Unused records are in no participant, so every counter starts at zero.
        let mut overlaps = vec![0usize; participants.len()];

        for &pos in used_candidates.iter().take(budget) {
            candidates_tried += 1;
            let fp = &reference.fingerprints()[pos];
            let worst = participants
                .iter()
                .zip(&overlaps)
                .map(|(p, &n)| n + usize::from(p.contains(fp)))
                .max()
                .unwrap_or(0);
            if worst > cfg.duplicate_threshold {
                continue;
            }
            for (p, n) in participants.iter().zip(overlaps.iter_mut()) {
                if p.contains(fp) {
                    *n += 1;
                }
            }
            selected.push(pos);
            from_fallback += 1;
            if selected.len() >= cfg.target_size {
                break;
            }
        }
        debug!(candidates_tried, from_fallback, budget, "unique_fallback");
    }

    selected.sort_by(|&a, &b| reference.fingerprints()[a].cmp(&reference.fingerprints()[b]));
    let records: Vec<Record> = selected
        .iter()
        .map(|&p| reference.records()[p].clone())
        .collect();
    let shortfall = cfg.target_size - records.len();

    info!(
        unused_available,
        from_unused,
        from_fallback,
        selected = records.len(),
        seed,
        "unique_selection_complete"
    );
    if shortfall > 0 {
        warn!(shortfall, target_size = cfg.target_size, "selection_shortfall");
    }

    Ok(UniqueSelection {
        records,
        unused_available,
        from_unused,
        from_fallback,
        candidates_tried,
        shortfall,
        seed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use canonical::fingerprint;
    use serde_json::{json, Value};

    fn rows(range: std::ops::Range<usize>) -> Vec<Value> {
        range.map(|i| json!({ "prompt": i })).collect()
    }

    fn cfg(target_size: usize, duplicate_threshold: usize) -> UniqueConfig {
        UniqueConfig {
            target_size,
            duplicate_threshold,
            seed: Some(11),
            ..Default::default()
        }
    }

    #[test]
    fn samples_only_unused_when_enough() {
        let reference = Collection::from_records("reference", rows(0..500));
        let participants = vec![Collection::from_records("miner_1", rows(0..200))];
        let selection = select_unique(&reference, &participants, &cfg(250, 100)).unwrap();

        assert_eq!(selection.len(), 250);
        assert_eq!(selection.unused_available, 300);
        assert_eq!(selection.from_fallback, 0);
        let used = UsedEntries::from_collections(&participants);
        assert!(selection.records.iter().all(|r| !used.contains(&fingerprint(r))));
    }

    #[test]
    fn output_is_sorted_by_fingerprint() {
        let reference = Collection::from_records("reference", rows(0..40));
        let selection = select_unique(&reference, &[], &cfg(20, 100)).unwrap();
        let fps: Vec<_> = selection.records.iter().map(fingerprint).collect();
        let mut sorted = fps.clone();
        sorted.sort();
        assert_eq!(fps, sorted);
    }

    #[test]
    fn fallback_respects_per_participant_threshold() {
        let reference = Collection::from_records("reference", rows(0..100));
        let participants = vec![
            Collection::from_records("miner_1", rows(0..60)),
            Collection::from_records("miner_2", rows(60..90)),
        ];
        // 10 unused; need 30 more from used, at most 5 shared with each participant.
        let selection = select_unique(&reference, &participants, &cfg(40, 5)).unwrap();

        assert_eq!(selection.from_unused, 10);
        assert_eq!(selection.from_fallback, 10);
        assert_eq!(selection.len(), 20);
        assert_eq!(selection.shortfall, 20);
        assert_eq!(selection.candidates_tried, 90);

        let chosen = Collection::from_records("chosen", selection.records.clone());
        for p in &participants {
            assert!(matcher::overlap_count(&chosen, p) <= 5);
        }
    }

    #[test]
    fn fallback_budget_is_bounded() {
        let reference = Collection::from_records("reference", rows(0..1000));
        let participants = vec![Collection::from_records("miner_1", rows(0..1000))];
        let mut config = cfg(10, 1);
        config.fallback_factor = 3;
        let selection = select_unique(&reference, &participants, &config).unwrap();
        // Only the first used record fits under the threshold; the rest are skipped.
        assert_eq!(selection.candidates_tried, 30);
        assert_eq!(selection.from_fallback, 1);
        assert_eq!(selection.len(), 1);
        assert_eq!(selection.shortfall, 9);
    }

    #[test]
    fn same_seed_same_records() {
        let reference = Collection::from_records("reference", rows(0..300));
        let a = select_unique(&reference, &[], &cfg(50, 100)).unwrap();
        let b = select_unique(&reference, &[], &cfg(50, 100)).unwrap();
        assert_eq!(a.records, b.records);
    }
}

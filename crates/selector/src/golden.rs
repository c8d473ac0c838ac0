//! Three-phase golden selection.
//!
//! 1. golden entries nobody has submitted yet, in golden order;
//! 2. golden entries already in use, up to `max_reused_golden`;
//! 3. a seeded random fill from the rest of the reference set.
//!
//! Every phase stops at `target_size`. A short result is returned as is with
//! its `shortfall`; nothing is padded.

use canonical::Fingerprint;
use hashbrown::HashSet;
use index::{GoldenEntry, UsedEntries};
use ingest::{Collection, Record};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{resolve_seed, SelectorConfig};
use crate::error::SelectorError;

/// Outcome of [`select_golden`].
#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    pub records: Vec<Record>,
    /// Reference positions, aligned with `records`.
    pub positions: Vec<usize>,
    pub golden_unique: usize,
    pub golden_reused: usize,
    pub filled: usize,
    /// `target_size - records.len()`.
    pub shortfall: usize,
    /// Seed used for the random fill.
    pub seed: u64,
}

impl Selection {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn golden_total(&self) -> usize {
        self.golden_unique + self.golden_reused
    }

    pub fn into_collection(self, id: impl Into<String>) -> Collection {
        Collection::from_records(id, self.records)
    }
}

struct Picker<'a> {
    reference: &'a Collection,
    target: usize,
    positions: Vec<usize>,
    taken_positions: HashSet<usize>,
    taken_fps: HashSet<&'a Fingerprint>,
}

impl<'a> Picker<'a> {
    fn full(&self) -> bool {
        self.positions.len() >= self.target
    }

    fn is_taken(&self, position: usize) -> bool {
        self.taken_positions.contains(&position)
            || self.taken_fps.contains(&self.reference.fingerprints()[position])
    }

    fn take(&mut self, position: usize) {
        let reference = self.reference;
        self.taken_positions.insert(position);
        self.taken_fps.insert(&reference.fingerprints()[position]);
        self.positions.push(position);
    }
}

/// Build a submission from `reference`, favouring `golden` positions.
pub fn select_golden(
    reference: &Collection,
    golden: &[GoldenEntry],
    used: &UsedEntries,
    cfg: &SelectorConfig,
) -> Result<Selection, SelectorError> {
    cfg.validate()?;
    let seed = resolve_seed(cfg.seed);
    let fps = reference.fingerprints();

    let mut picker = Picker {
        reference,
        target: cfg.target_size,
        positions: Vec::with_capacity(cfg.target_size),
        taken_positions: HashSet::new(),
        taken_fps: HashSet::new(),
    };

    let golden_positions: Vec<usize> = golden
        .iter()
        .map(|g| g.position)
        .filter(|&p| p < reference.len())
        .collect();

    let mut golden_unique = 0;
    for &pos in &golden_positions {
        if picker.full() {
            break;
        }
        if !picker.is_taken(pos) && !used.contains(&fps[pos]) {
            picker.take(pos);
            golden_unique += 1;
        }
    }

    let mut golden_reused = 0;
    for &pos in &golden_positions {
        if picker.full() || golden_reused >= cfg.max_reused_golden {
            break;
        }
        if !picker.is_taken(pos) && used.contains(&fps[pos]) {
            picker.take(pos);
            golden_reused += 1;
        }
    }

    let mut filled = 0;
    if !picker.full() {
        let mut seen: HashSet<&Fingerprint> = HashSet::new();
        let mut available: Vec<usize> = (0..reference.len())
            .filter(|&pos| !picker.is_taken(pos))
            .filter(|&pos| !(cfg.ensure_unique && used.contains(&fps[pos])))
            .filter(|&pos| seen.insert(&fps[pos]))
            .collect();

        let mut rng = fastrand::Rng::with_seed(seed);
        rng.shuffle(&mut available);
        let remaining = cfg.target_size - picker.positions.len();
        for pos in available.into_iter().take(remaining) {
            picker.take(pos);
            filled += 1;
        }
    }

    let positions = picker.positions;
    let records: Vec<Record> = positions
        .iter()
        .map(|&p| reference.records()[p].clone())
        .collect();
    let shortfall = cfg.target_size - records.len();

    info!(
        golden_available = golden_positions.len(),
        golden_unique,
        golden_reused,
        filled,
        selected = records.len(),
        seed,
        "selection_complete"
    );
    if shortfall > 0 {
        warn!(
            shortfall,
            target_size = cfg.target_size,
            "selection_shortfall"
        );
    }

    Ok(Selection {
        records,
        positions,
        golden_unique,
        golden_reused,
        filled,
        shortfall,
        seed,
    })
}

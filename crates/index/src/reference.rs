use canonical::Fingerprint;
use hashbrown::HashMap;
use ingest::Collection;

/// Fingerprint → first position in the reference collection.
///
/// Built once from the evaluation set and read-only afterwards. Records that
/// repeat inside the reference collapse to their first occurrence.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    positions: HashMap<Fingerprint, usize>,
    reference_len: usize,
}

impl ReferenceIndex {
    pub fn build(reference: &Collection) -> Self {
        let mut positions = HashMap::with_capacity(reference.distinct_len());
        for (pos, fp) in reference.fingerprints().iter().enumerate() {
            positions.entry(fp.clone()).or_insert(pos);
        }
        Self {
            positions,
            reference_len: reference.len(),
        }
    }

    pub fn position_of(&self, fp: &Fingerprint) -> Option<usize> {
        self.positions.get(fp).copied()
    }

    pub fn contains(&self, fp: &Fingerprint) -> bool {
        self.positions.contains_key(fp)
    }

    /// Sorted, duplicate-free reference positions of the records in `collection`.
    pub fn positions_in(&self, collection: &Collection) -> Vec<usize> {
        let mut out: Vec<usize> = collection
            .fingerprint_set()
            .iter()
            .filter_map(|fp| self.position_of(fp))
            .collect();
        out.sort_unstable();
        out
    }

    /// Number of distinct fingerprints in the reference.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Record count of the reference collection, duplicates included.
    pub fn reference_len(&self) -> usize {
        self.reference_len
    }
}

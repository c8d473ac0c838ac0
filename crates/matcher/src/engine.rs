use std::time::Instant;

use canonical::ContentHash;
use hashbrown::HashMap;
use index::ReferenceIndex;
use ingest::Collection;
use rayon::prelude::*;
use tracing::debug;

use crate::types::MatchError;


/// Number of distinct fingerprints shared by `a` and `b`.
///
/// Iterates the smaller set, so the cost is `O(min(|a|, |b|))`.
pub fn overlap_count(a: &Collection, b: &Collection) -> usize {
    let (small, large) = if a.distinct_len() <= b.distinct_len() {
        (a, b)
    } else {
        (b, a)
    };
    small
        .fingerprint_set()
        .iter()
        .filter(|fp| large.contains(fp))
        .count()
}

/// Sorted, duplicate-free reference positions of the records in `collection`.
pub fn positions_in_reference(collection: &Collection, index: &ReferenceIndex) -> Vec<usize> {
    index.positions_in(collection)
}

/// Order-insensitive digest of the collection's fingerprints.
pub fn content_hash(collection: &Collection) -> ContentHash {
    collection.content_hash()
}

/// Pairwise overlap counts between a set of collections.
///
/// Ids are kept in sorted order. Each unordered pair is computed once; the
/// diagonal holds each collection's distinct record count. Results are the
/// same whether or not the rayon pool is used.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    ids: Vec<String>,
    lookup: HashMap<String, usize>,
    counts: Vec<usize>,
}

impl SimilarityMatrix {
    pub fn build(collections: &[Collection], use_parallel: bool) -> Result<Self, MatchError> {
        let start = Instant::now();
        let mut ordered: Vec<&Collection> = collections.iter().collect();
        ordered.sort_by(|a, b| a.id().cmp(b.id()));
        if let Some(pair) = ordered.windows(2).find(|w| w[0].id() == w[1].id()) {
            return Err(MatchError::DuplicateId(pair[0].id().to_string()));
        }

        let n = ordered.len();
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .collect();
        let overlaps: Vec<usize> = if use_parallel {
            pairs
                .par_iter()
                .map(|&(i, j)| overlap_count(ordered[i], ordered[j]))
                .collect()
        } else {
            pairs
                .iter()
                .map(|&(i, j)| overlap_count(ordered[i], ordered[j]))
                .collect()
        };

        let mut counts = vec![0usize; n * n];
        for (i, c) in ordered.iter().enumerate() {
            counts[i * n + i] = c.distinct_len();
        }
        for (&(i, j), &overlap) in pairs.iter().zip(&overlaps) {
            counts[i * n + j] = overlap;
            counts[j * n + i] = overlap;
        }

        let ids: Vec<String> = ordered.iter().map(|c| c.id().to_string()).collect();
        let lookup = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        debug!(
            collections = n,
            pairs = pairs.len(),
            use_parallel,
            elapsed_micros = start.elapsed().as_micros(),
            "similarity_matrix_built"
        );
        Ok(Self {
            ids,
            lookup,
            counts,
        })
    }

    /// Collection ids in sorted order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Overlap between `a` and `b`; `None` if either id is unknown.
    pub fn get(&self, a: &str, b: &str) -> Option<usize> {
        let i = *self.lookup.get(a)?;
        let j = *self.lookup.get(b)?;
        Some(self.at(i, j))
    }

    /// The other collection sharing the most records with `id`.
    ///
    /// Ties go to the smaller id. `None` when `id` is unknown or alone.
    pub fn max_for(&self, id: &str) -> Option<(&str, usize)> {
        let i = *self.lookup.get(id)?;
        let mut best: Option<(usize, usize)> = None;
        for j in (0..self.len()).filter(|&j| j != i) {
            let overlap = self.at(i, j);
            if best.map_or(true, |(_, b)| overlap > b) {
                best = Some((j, overlap));
            }
        }
        best.map(|(j, overlap)| (self.ids[j].as_str(), overlap))
    }

    /// Every unordered pair `(a, b, overlap)` with `a < b`.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str, usize)> + '_ {
        let n = self.len();
        (0..n).flat_map(move |i| {
            ((i + 1)..n).map(move |j| (self.ids[i].as_str(), self.ids[j].as_str(), self.at(i, j)))
        })
    }

    /// Mean overlap over all unordered pairs; `None` with fewer than two collections.
    pub fn average(&self) -> Option<f64> {
        let (sum, count) = self
            .pairs()
            .fold((0usize, 0usize), |(s, c), (_, _, o)| (s + o, c + 1));
        (count > 0).then(|| sum as f64 / count as f64)
    }

    /// The pair with the largest overlap, first in id order on ties.
    pub fn max(&self) -> Option<(&str, &str, usize)> {
        self.pairs().fold(None, |best, pair| match best {
            Some((_, _, b)) if pair.2 <= b => best,
            _ => Some(pair),
        })
    }

    pub(crate) fn at(&self, i: usize, j: usize) -> usize {
        self.counts[i * self.len() + j]
    }
}

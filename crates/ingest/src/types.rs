//! Core data model types for the ingest crate.
//!
//! ```text
//! data.jsonl ──load_collection()──▶ LoadedCollection
//!                                   ├── collection: Collection
//!                                   │   ├── id
//!                                   │   ├── records       (ordered, immutable)
//!                                   │   ├── fingerprints  (aligned with records)
//!                                   │   └── fingerprint set (O(1) membership)
//!                                   └── report: LoadReport (dropped/blank/truncated)
//! ```

use canonical::{content_hash, fingerprint, ContentHash, Fingerprint};
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON record. Opaque to the engine except for equality testing.
pub type Record = Value;

/// An ordered, immutable sequence of records from one source.
///
/// Fingerprints are computed once at construction; every later comparison
/// works on them.
#[derive(Debug, Clone)]
pub struct Collection {
    id: String,
    records: Vec<Record>,
    fingerprints: Vec<Fingerprint>,
    fingerprint_set: HashSet<Fingerprint>,
}

impl Collection {
    /// Build a collection from records already in memory.
    pub fn from_records(id: impl Into<String>, records: Vec<Record>) -> Self {
        let fingerprints: Vec<Fingerprint> = records.iter().map(fingerprint).collect();
        let fingerprint_set = fingerprints.iter().cloned().collect();
        Self {
            id: id.into(),
            records,
            fingerprints,
            fingerprint_set,
        }
    }

    /// Source identifier (participant directory name, `reference`, ...).
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Per-record fingerprints, aligned with [`records`](Self::records).
    pub fn fingerprints(&self) -> &[Fingerprint] {
        &self.fingerprints
    }

    pub fn fingerprint_set(&self) -> &HashSet<Fingerprint> {
        &self.fingerprint_set
    }

    /// Number of records, duplicates included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of distinct fingerprints.
    pub fn distinct_len(&self) -> usize {
        self.fingerprint_set.len()
    }

    pub fn contains(&self, fp: &Fingerprint) -> bool {
        self.fingerprint_set.contains(fp)
    }

    /// Digest over the sorted fingerprint multiset.
    pub fn content_hash(&self) -> ContentHash {
        content_hash(&self.fingerprints)
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

/// Diagnostics gathered while loading one JSONL resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Physical lines read, blank ones included.
    pub total_lines: usize,
    /// Lines that were empty or whitespace only.
    pub blank_lines: usize,
    /// Lines that were not valid JSON (or not valid UTF-8) and were dropped.
    pub dropped_lines: usize,
    /// Parsed records discarded by the `max_rows` cap.
    pub truncated_records: usize,
}

impl LoadReport {
    pub fn has_drops(&self) -> bool {
        self.dropped_lines > 0
    }
}

/// A collection together with how it was loaded.
#[derive(Debug, Clone)]
pub struct LoadedCollection {
    pub collection: Collection,
    pub report: LoadReport,
}

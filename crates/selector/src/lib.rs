//! # Dataset Selector
//!
//! Builds a submission out of the reference set under overlap constraints.
//!
//! - [`select_golden`]: favours widely reused ("golden") reference positions,
//!   preferring ones no participant has submitted, caps the already-used
//!   ones, then fills at random with a seeded [`fastrand::Rng`].
//! - [`select_unique`]: samples records no participant uses, falling back to
//!   used ones only while every per-participant overlap stays in bounds.
//! - [`verify_overlap`]: reports the largest overlap of a result with any
//!   participant and every participant above the duplicate threshold.
//!
//! Shortfalls are reported on the result, never padded. Randomness is
//! always seeded; when no seed is configured one is drawn and returned so
//! the run can be replayed.
//!
//! ```
//! use index::{analyze_usage, ReferenceIndex, UsedEntries};
//! use ingest::Collection;
//! use selector::{select_golden, verify_overlap, SelectorConfig};
//! use serde_json::json;
//!
//! let rows = |r: std::ops::Range<u32>| r.map(|i| json!({ "q": i })).collect::<Vec<_>>();
//! let reference = Collection::from_records("reference", rows(0..100));
//! let participants = vec![
//!     Collection::from_records("miner_1", rows(0..10)),
//!     Collection::from_records("miner_2", rows(0..10)),
//! ];
//!
//! let index = ReferenceIndex::build(&reference);
//! let golden = analyze_usage(&index, &participants).golden_entries(0.5).unwrap();
//! let used = UsedEntries::from_collections(&participants);
//!
//! let cfg = SelectorConfig::default().with_target_size(30).with_seed(7);
//! let selection = select_golden(&reference, &golden, &used, &cfg).unwrap();
//! assert_eq!(selection.golden_reused, 10);
//! assert_eq!(selection.filled, 20);
//!
//! let check = verify_overlap(&selection.into_collection("mine"), &participants, 100);
//! assert_eq!(check.max_overlap, 10);
//! ```

mod config;
mod error;
mod golden;
mod unique;
mod verify;

pub use crate::config::{
    SelectorConfig, UniqueConfig, DEFAULT_FALLBACK_FACTOR, DEFAULT_MAX_REUSED_GOLDEN,
    DEFAULT_TARGET_SIZE,
};
pub use crate::error::SelectorError;
pub use crate::golden::{select_golden, Selection};
pub use crate::unique::{select_unique, UniqueSelection};
pub use crate::verify::{verify_overlap, OverlapVerification};

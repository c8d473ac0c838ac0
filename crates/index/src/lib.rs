//! # Reference Index
//!
//! Maps the reference (evaluation) collection by fingerprint and measures how
//! the participant collections reuse it.
//!
//! ## Core pieces
//!
//! - [`ReferenceIndex`]: fingerprint → first position in the reference set.
//! - [`analyze_usage`] / [`UsageFrequency`]: per-position count of the
//!   collections containing that record, and the [`GoldenEntry`] list of
//!   widely reused positions.
//! - [`UsedEntries`]: union of every participant fingerprint, used to tell
//!   fresh reference records from ones already submitted.
//!
//! ## Example
//!
//! ```
//! use index::{analyze_usage, ReferenceIndex};
//! use ingest::Collection;
//! use serde_json::json;
//!
//! let reference = Collection::from_records("reference", (0..4).map(|i| json!(i)).collect());
//! let index = ReferenceIndex::build(&reference);
//!
//! let a = Collection::from_records("miner_1", vec![json!(0), json!(1)]);
//! let b = Collection::from_records("miner_2", vec![json!(1)]);
//! let usage = analyze_usage(&index, [&a, &b]);
//!
//! let golden = usage.golden_entries(0.5).unwrap();
//! assert_eq!(golden[0].position, 1);
//! assert_eq!(golden[0].count, 2);
//! ```

mod error;
mod reference;
mod usage;
mod used;

pub use crate::error::IndexError;
pub use crate::reference::ReferenceIndex;
pub use crate::usage::{analyze_usage, GoldenEntry, UsageFrequency, DEFAULT_MIN_USAGE_FRACTION};
pub use crate::used::UsedEntries;

//! DSFP canonical record layer.
//!
//! Turns arbitrary JSON records into deterministic [`Fingerprint`]s and
//! collections of fingerprints into order-insensitive [`ContentHash`]es.
//! Every overlap, clustering and selection decision downstream is an equality
//! test on fingerprints, so this crate is where identity is defined.
//!
//! ## Pure function guarantee
//!
//! No I/O, no clock calls, no hash seeds, no locale dependence. The same
//! record produces the same fingerprint on any machine and in any run.
//!
//! ## Invariants worth knowing
//!
//! - Key insertion order never matters; key spelling, value types and array
//!   order always do.
//! - `1` and `1.0` are different records, and numbers are never rounded
//!   (see [`fingerprint`] module docs).
//! - Digest = SHA-256(version || 0x00 || sorted fingerprints joined by `\n`).

mod error;
mod fingerprint;
mod hash;

pub use crate::error::CanonicalError;
pub use crate::fingerprint::{fingerprint, fingerprint_str, Fingerprint, FINGERPRINT_VERSION};
pub use crate::hash::{content_hash, ContentHash};

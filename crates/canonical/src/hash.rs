//! Hashing utilities for fingerprints and collections.
//!
//! # Collection Digest
//!
//! ```text
//! SHA-256(version.to_be_bytes() || 0x00 || fp_1 || 0x0A || fp_2 || 0x0A || ... || fp_n)
//! ```
//!
//! The fingerprints are sorted before hashing, so two collections holding the
//! same multiset of records in different orders produce the same digest. The
//! list is not deduplicated: repeating a record changes the digest.
//!
//! Fingerprints never contain a raw `0x0A` byte (newlines inside strings are
//! escaped), which keeps the separator unambiguous.
//!
//! # Examples
//!
//! ```rust
//! use canonical::{content_hash, fingerprint};
//! use serde_json::json;
//!
//! let a = vec![fingerprint(&json!({"q": 1})), fingerprint(&json!({"q": 2}))];
//! let b = vec![fingerprint(&json!({"q": 2})), fingerprint(&json!({"q": 1}))];
//! assert_eq!(content_hash(&a), content_hash(&b));
//! assert_eq!(content_hash(&a).as_str().len(), 64);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::fingerprint::{Fingerprint, FINGERPRINT_VERSION};

/// Hex-encoded SHA-256 digest over a sorted fingerprint multiset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 16 hex characters, for log lines and tables.
    pub fn short(&self) -> &str {
        &self.0[..16.min(self.0.len())]
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Order-insensitive, multiplicity-sensitive digest of a fingerprint list.
pub fn content_hash(fingerprints: &[Fingerprint]) -> ContentHash {
    let mut sorted: Vec<&Fingerprint> = fingerprints.iter().collect();
    sorted.sort_unstable();

    let mut hasher = Sha256::new();
    hasher.update(FINGERPRINT_VERSION.to_be_bytes());
    hasher.update([0]);
    for (i, fp) in sorted.into_iter().enumerate() {
        if i > 0 {
            hasher.update([b'\n']);
        }
        hasher.update(fp.as_str().as_bytes());
    }
    ContentHash(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint;
    use serde_json::json;

    fn fps(values: &[serde_json::Value]) -> Vec<Fingerprint> {
        values.iter().map(fingerprint).collect()
    }

    #[test]
    fn order_invariant() {
        let a = fps(&[json!({"a": 1}), json!({"b": 2}), json!({"c": 3})]);
        let b = fps(&[json!({"c": 3}), json!({"a": 1}), json!({"b": 2})]);
        assert_eq!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn multiplicity_sensitive() {
        let once = fps(&[json!({"a": 1}), json!({"b": 2})]);
        let twice = fps(&[json!({"a": 1}), json!({"b": 2}), json!({"a": 1})]);
        assert_ne!(content_hash(&once), content_hash(&twice));
    }

    #[test]
    fn empty_collection_has_stable_digest() {
        assert_eq!(content_hash(&[]), content_hash(&[]));
        assert_ne!(content_hash(&[]), content_hash(&fps(&[json!({})])));
    }

    #[test]
    fn separator_prevents_concatenation_collisions() {
        let split = fps(&[json!("ab"), json!("c")]);
        let joined = fps(&[json!("a"), json!("bc")]);
        assert_ne!(content_hash(&split), content_hash(&joined));
    }

    #[test]
    fn short_prefix() {
        let hash = content_hash(&fps(&[json!(1)]));
        assert_eq!(hash.short().len(), 16);
        assert!(hash.as_str().starts_with(hash.short()));
    }
}

//! Canonical serialization of JSON records.
//!
//! A [`Fingerprint`] is the compact JSON text of a record with object keys
//! sorted at every nesting level. The writer walks the value tree itself and
//! sorts keys explicitly, so the output does not depend on which map type
//! `serde_json` was compiled with (`preserve_order` or not).
//!
//! # Rules (version 2)
//!
//! - Object keys are sorted by their UTF-8 bytes.
//! - Arrays keep their element order.
//! - Numbers keep their source literal. `serde_json` is built with
//!   `arbitrary_precision`, so integers beyond the 64-bit range and long
//!   decimals are never rounded through `f64`. No numeric normalization is
//!   applied: `1`, `1.0` and `1e0` are different fingerprints.
//! - Strings are compared byte-for-byte. No case folding, no Unicode
//!   normalization.
//! - No insignificant whitespace is emitted.
//!
//! Any change to these rules must bump [`FINGERPRINT_VERSION`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CanonicalError;

/// Version of the canonical serialization rules.
///
/// Folded into every [`ContentHash`](crate::ContentHash) so digests produced
/// under different rules never compare equal.
pub const FINGERPRINT_VERSION: u32 = 2;

/// Canonical string form of a record. Two records are identical iff their
/// fingerprints are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Borrow the canonical text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the canonical text in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Compute the fingerprint of a record.
///
/// ```rust
/// use canonical::fingerprint;
/// use serde_json::json;
///
/// let a = fingerprint(&json!({"b": 1, "a": {"y": true, "x": null}}));
/// let b = fingerprint(&json!({"a": {"x": null, "y": true}, "b": 1}));
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), r#"{"a":{"x":null,"y":true},"b":1}"#);
/// ```
pub fn fingerprint(record: &Value) -> Fingerprint {
    let mut out = String::with_capacity(64);
    write_value(&mut out, record);
    Fingerprint(out)
}

/// Parse one JSON document and fingerprint it.
pub fn fingerprint_str(text: &str) -> Result<Fingerprint, CanonicalError> {
    let value: Value =
        serde_json::from_str(text).map_err(|err| CanonicalError::InvalidJson(err.to_string()))?;
    Ok(fingerprint(&value))
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_escaped(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_unstable_by(|(a, _), (b, _)| a.as_bytes().cmp(b.as_bytes()));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_escaped(out, key);
                out.push(':');
                write_value(out, item);
            }
            out.push('}');
        }
    }
}

// Same escape set as serde_json's compact formatter.
fn write_escaped(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_sorted_at_every_level() {
        let fp = fingerprint(&json!({
            "z": [{"b": 2, "a": 1}],
            "m": {"d": {"f": 0, "e": 0}},
            "a": "x"
        }));
        assert_eq!(
            fp.as_str(),
            r#"{"a":"x","m":{"d":{"e":0,"f":0}},"z":[{"a":1,"b":2}]}"#
        );
    }

    #[test]
    fn array_order_is_significant() {
        assert_ne!(fingerprint(&json!([1, 2])), fingerprint(&json!([2, 1])));
    }

    #[test]
    fn integer_and_float_are_distinct() {
        let int = fingerprint_str(r#"{"n": 1}"#).expect("int");
        let float = fingerprint_str(r#"{"n": 1.0}"#).expect("float");
        assert_ne!(int, float);
        assert_eq!(float.as_str(), r#"{"n":1.0}"#);
    }

    #[test]
    fn integers_beyond_u64_keep_their_digits() {
        let a = fingerprint_str(r#"{"n": 18446744073709551616}"#).expect("a");
        let b = fingerprint_str(r#"{"n": 18446744073709551617}"#).expect("b");
        assert_ne!(a, b);
        assert_eq!(a.as_str(), r#"{"n":18446744073709551616}"#);
    }

    #[test]
    fn long_decimals_and_exponents_are_kept_verbatim() {
        let long = fingerprint_str("[0.10000000000000000001, 1e0]").expect("long");
        assert_eq!(long.as_str(), "[0.10000000000000000001,1e0]");
        assert_ne!(
            fingerprint_str("0.1").expect("short"),
            fingerprint_str("0.10000000000000000001").expect("long")
        );
    }

    #[test]
    fn strings_are_case_sensitive() {
        assert_ne!(
            fingerprint(&json!({"role": "User"})),
            fingerprint(&json!({"role": "user"}))
        );
    }

    #[test]
    fn escapes_match_serde_json() {
        let value = json!("line\nbreak \"quoted\" tab\t bell\u{07} caf\u{e9}");
        let expected = serde_json::to_string(&value).expect("serialize");
        assert_eq!(fingerprint(&value).as_str(), expected);
    }

    #[test]
    fn whitespace_in_source_is_irrelevant() {
        let a = fingerprint_str("{ \"a\" : [ 1 , 2 ] }").expect("a");
        let b = fingerprint_str(r#"{"a":[1,2]}"#).expect("b");
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_json_rejected() {
        let res = fingerprint_str("{not json");
        assert!(matches!(res, Err(CanonicalError::InvalidJson(_))));
    }

    #[test]
    fn serde_transparent() {
        let fp = fingerprint(&json!({"k": 1}));
        let encoded = serde_json::to_string(&fp).expect("encode");
        assert_eq!(encoded, r#""{\"k\":1}""#);
    }
}

//! Value fingerprints for change detection.
//!
//! A fingerprint is a SHA-256 digest over a tagged canonical encoding of a
//! field value. Fingerprints are captured for every tracked field at each
//! load/save boundary; a field is modified iff its current fingerprint
//! differs from that baseline. Hashing the value instead of flagging every
//! setter means mutation through any path - direct assignment, row
//! hydration - is detected, at the cost of an O(field count) recompute per
//! check.

use chrono::Datelike;
use rowmap_sql::SqlValue;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A value fingerprint.
///
/// Equal-by-value inputs always produce equal fingerprints, even across
/// separately constructed instances.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Returns the raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint(")?;
        for byte in &self.0[..4] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "..)")
    }
}

/// Computes the fingerprint of a value.
///
/// Each variant is hashed under a distinct tag so values of different
/// types never collide structurally (`Integer(0)` vs `Bool(false)` vs
/// `Null`).
#[must_use]
pub fn fingerprint_value(value: &SqlValue) -> Fingerprint {
    let mut hasher = Sha256::new();
    match value {
        SqlValue::Null => hasher.update([0u8]),
        SqlValue::Bool(b) => {
            hasher.update([1u8, u8::from(*b)]);
        }
        SqlValue::Integer(i) => {
            hasher.update([2u8]);
            hasher.update(i.to_le_bytes());
        }
        SqlValue::Float(f) => {
            hasher.update([3u8]);
            hasher.update(f.to_bits().to_le_bytes());
        }
        SqlValue::Text(s) => {
            hasher.update([4u8]);
            hasher.update(s.as_bytes());
        }
        SqlValue::Date(d) => {
            hasher.update([5u8]);
            hasher.update(d.num_days_from_ce().to_le_bytes());
        }
    }
    Fingerprint(hasher.finalize().into())
}

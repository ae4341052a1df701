//! The priority key domain.
//!
//! This module defines [`PriorityKey`], the dense numeric sort key that
//! determines rule evaluation order, and [`RuleId`], the store-assigned rule
//! identity used when keys are re-assigned in bulk.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Number of fractional digits carried by a priority key.
///
/// Matches a DECIMAL(10,6) storage column: six digits of fraction gives
/// roughly twenty successive midpoint bisections between two integer keys
/// before precision is exhausted.
pub const KEY_SCALE: u32 = 6;

/// A fixed-point decimal sort key over rules of one tenant.
///
/// Keys form a totally ordered, dense domain: between any two keys that are
/// not adjacent at [`KEY_SCALE`] digits there is always a third. Rules are
/// evaluated in ascending key order.
///
/// All constructors clamp to [`KEY_SCALE`] fractional digits, so two keys that
/// are numerically equal at that precision compare equal regardless of how
/// they were produced.
///
/// # Examples
///
/// ```
/// use palisade_ordering::key::PriorityKey;
///
/// let a = PriorityKey::from_int(1);
/// let b = PriorityKey::from_int(2);
/// let mid = a.midpoint(&b);
/// assert!(a < mid && mid < b);
/// assert_eq!(mid.to_string(), "1.5");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriorityKey(Decimal);

impl PriorityKey {
    /// Creates a key from a decimal value, rounding to [`KEY_SCALE`] digits.
    pub fn new(value: Decimal) -> Self {
        Self(value.round_dp(KEY_SCALE).normalize())
    }

    /// Creates a key from an integer value.
    pub fn from_int(value: i64) -> Self {
        Self(Decimal::from(value))
    }

    /// The default starting key for an empty tenant.
    pub fn start() -> Self {
        Self(Decimal::ONE)
    }

    /// The smallest representable distance between two distinct keys.
    pub fn step() -> Decimal {
        Decimal::new(1, KEY_SCALE)
    }

    /// Returns the underlying decimal value.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Returns `self + 1`, the key one whole slot later.
    pub fn plus_one(&self) -> Self {
        Self::new(self.0 + Decimal::ONE)
    }

    /// Returns `self - 1`, the key one whole slot earlier.
    pub fn minus_one(&self) -> Self {
        Self::new(self.0 - Decimal::ONE)
    }

    /// Returns the key one smallest representable step later.
    pub fn next_step(&self) -> Self {
        Self::new(self.0 + Self::step())
    }

    /// Returns the arithmetic midpoint of `self` and `other` at key precision.
    ///
    /// If the two keys are adjacent at [`KEY_SCALE`] digits the midpoint
    /// collapses onto one of the bounds; callers that need strict betweenness
    /// must check for that (see
    /// [`PriorityKeySpace::between`](crate::keyspace::PriorityKeySpace::between)).
    pub fn midpoint(&self, other: &Self) -> Self {
        Self::new((self.0 + other.0) / Decimal::TWO)
    }
}

impl fmt::Display for PriorityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for PriorityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PriorityKey({})", self.0)
    }
}

impl FromStr for PriorityKey {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(PriorityKey::new(Decimal::from_str(s)?))
    }
}

impl From<Decimal> for PriorityKey {
    fn from(value: Decimal) -> Self {
        PriorityKey::new(value)
    }
}

/// A store-assigned rule identifier.
///
/// Opaque to the ordering engine except as a deterministic tie-breaker when
/// bumping any-source rules that share a key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(i64);

impl RuleId {
    /// Creates a rule id from its raw integer value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw integer value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RuleId({})", self.0)
    }
}

impl From<i64> for RuleId {
    fn from(value: i64) -> Self {
        RuleId::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_ordering() {
        let a = PriorityKey::from_int(1);
        let b: PriorityKey = "1.5".parse().unwrap();
        let c = PriorityKey::from_int(2);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_key_equality_ignores_scale() {
        let a: PriorityKey = "1.500000".parse().unwrap();
        let b: PriorityKey = "1.5".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_clamps_to_scale() {
        let key: PriorityKey = "1.00000049".parse().unwrap();
        assert_eq!(key, PriorityKey::from_int(1));
    }

    #[test]
    fn test_plus_minus_one() {
        let key: PriorityKey = "2.5".parse().unwrap();
        assert_eq!(key.plus_one().to_string(), "3.5");
        assert_eq!(key.minus_one().to_string(), "1.5");
    }

    #[test]
    fn test_midpoint() {
        let a = PriorityKey::from_int(5);
        let b = PriorityKey::from_int(7);
        assert_eq!(a.midpoint(&b), PriorityKey::from_int(6));
    }

    #[test]
    fn test_midpoint_collapses_at_precision_limit() {
        let a: PriorityKey = "1.000001".parse().unwrap();
        let b = a.next_step();
        let mid = a.midpoint(&b);
        assert!(mid == a || mid == b);
    }

    #[test]
    fn test_next_step_is_smallest_distance() {
        let a = PriorityKey::from_int(1);
        let b = a.next_step();
        assert!(a < b);
        assert_eq!(b.as_decimal() - a.as_decimal(), PriorityKey::step());
    }

    #[test]
    fn test_display() {
        assert_eq!(PriorityKey::from_int(3).to_string(), "3");
        let key: PriorityKey = "2.25".parse().unwrap();
        assert_eq!(key.to_string(), "2.25");
    }

    #[test]
    fn test_serde_roundtrip() {
        let key: PriorityKey = "1.5".parse().unwrap();
        let json = serde_json::to_string(&key).unwrap();
        let parsed: PriorityKey = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn test_rule_id() {
        let id = RuleId::new(42);
        assert_eq!(id.as_i64(), 42);
        assert_eq!(id.to_string(), "42");
        assert!(RuleId::new(1) < RuleId::new(2));
    }
}

//! The dense key space primitive.
//!
//! [`PriorityKeySpace`] computes a key strictly between two existing keys, or
//! at either open end of a tenant's sequence. It is the only place keys are
//! invented; the resolver and service layers decide *where* a key goes, this
//! module decides *what* the key is.

use crate::error::{OrderingError, OrderingResult};
use crate::key::{KEY_SCALE, PriorityKey};

/// Computes keys between, before, or after existing keys.
///
/// # Contract
///
/// `between(prev, next)`:
/// - both absent: the default starting key (`1`)
/// - only `next`: `next - 1` (place before the first element)
/// - only `prev`: `prev + 1` (place after the last element)
/// - both: the arithmetic midpoint `(prev + next) / 2`, guaranteed strictly
///   between the bounds
///
/// When `prev` and `next` are numerically adjacent at [`KEY_SCALE`] digits the
/// midpoint collapses onto a bound and no strictly-between key exists. That is
/// surfaced as [`OrderingError::PrecisionExhausted`]: the span needs an
/// out-of-band full renumbering pass, which is not part of per-operation logic.
///
/// # Examples
///
/// ```
/// use palisade_ordering::key::PriorityKey;
/// use palisade_ordering::keyspace::PriorityKeySpace;
///
/// let five = PriorityKey::from_int(5);
/// let seven = PriorityKey::from_int(7);
/// assert_eq!(
///     PriorityKeySpace::between(Some(five), Some(seven)).unwrap(),
///     PriorityKey::from_int(6),
/// );
/// assert_eq!(
///     PriorityKeySpace::between(None, None).unwrap(),
///     PriorityKey::from_int(1),
/// );
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PriorityKeySpace;

impl PriorityKeySpace {
    /// Returns a key between the given bounds, per the contract above.
    ///
    /// # Errors
    ///
    /// [`OrderingError::PrecisionExhausted`] when both bounds are present and
    /// adjacent at key precision.
    pub fn between(
        prev: Option<PriorityKey>,
        next: Option<PriorityKey>,
    ) -> OrderingResult<PriorityKey> {
        match (prev, next) {
            (None, None) => Ok(PriorityKey::start()),
            (None, Some(next)) => Ok(next.minus_one()),
            (Some(prev), None) => Ok(prev.plus_one()),
            (Some(prev), Some(next)) => {
                let mid = prev.midpoint(&next);
                if mid > prev && mid < next {
                    Ok(mid)
                } else {
                    Err(OrderingError::PrecisionExhausted {
                        prev,
                        next,
                        scale: KEY_SCALE,
                    })
                }
            }
        }
    }
}

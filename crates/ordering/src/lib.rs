//! Palisade Rule Priority Ordering Engine
//!
//! This crate maintains a dense, collision-free, efficiently-reorderable total
//! order over firewall rules. Rules are sorted by a fixed-point decimal
//! [`PriorityKey`] and evaluated ascending. One structural invariant governs
//! the whole key space: rules that match *any source* (an empty source set)
//! always sort after every rule with a concrete source set.
//!
//! # Components
//!
//! - [`key`] - The [`PriorityKey`](key::PriorityKey) domain: a totally ordered,
//!   dense key space supporting repeated midpoint bisection at six fractional
//!   digits.
//! - [`keyspace`] - [`PriorityKeySpace`](keyspace::PriorityKeySpace), the
//!   primitive for computing a key strictly between two existing keys or at
//!   either open end of the sequence.
//! - [`resolver`] - [`ConflictResolver`](resolver::ConflictResolver), which
//!   validates a candidate key against a tenant's current key set and produces
//!   the minimal batch of key re-assignments (a *bump*) needed to keep the
//!   any-source block last.
//! - [`error`] - The ordering error taxonomy.
//!
//! # Example
//!
//! ```
//! use palisade_ordering::key::{PriorityKey, RuleId};
//! use palisade_ordering::resolver::{Candidate, ConflictResolver, TenantKeySet};
//!
//! // Two regular rules at 1 and 2, one any-source rule at 3.
//! let keys = TenantKeySet::from_rules(vec![
//!     (RuleId::new(1), PriorityKey::from_int(1), false),
//!     (RuleId::new(2), PriorityKey::from_int(2), false),
//!     (RuleId::new(3), PriorityKey::from_int(3), true),
//! ]);
//!
//! // Placing a regular rule at the any-source rule's key bumps it out of the way.
//! let placement = ConflictResolver::resolve(
//!     &keys,
//!     Candidate::Regular { requested: Some(PriorityKey::from_int(3)) },
//! )
//! .unwrap();
//!
//! assert_eq!(placement.key, PriorityKey::from_int(3));
//! assert_eq!(placement.bumps.len(), 1);
//! assert_eq!(placement.bumps[0].key, PriorityKey::from_int(4));
//! ```
//!
//! This crate is pure computation: it performs no I/O and holds no state. The
//! companion `palisade-persistence` crate owns the per-tenant critical section
//! and applies placements atomically.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod key;
pub mod keyspace;
pub mod resolver;

pub use error::{OrderingError, OrderingResult};
pub use key::{PriorityKey, RuleId};
pub use keyspace::PriorityKeySpace;
pub use resolver::{Candidate, ConflictResolver, KeyBump, KeyedRule, Placement, TenantKeySet};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

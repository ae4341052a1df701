//! Error types for the ordering engine.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::key::PriorityKey;

/// Errors produced while computing rule placements.
///
/// None of these are retried by the engine itself: both the placement decision
/// and the key computation are pure functions of current state, so retrying
/// with identical inputs reproduces the identical outcome. Callers decide how
/// to recover.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderingError {
    /// An explicitly requested key collides with another regular rule's key.
    ///
    /// Recoverable: the caller asked for a specific slot that is taken, and can
    /// pick a different key or omit the request entirely.
    #[error("priority {key} is already taken")]
    PriorityConflict { key: PriorityKey },

    /// Midpoint bisection can no longer produce a distinct key between two
    /// neighbors at the key space's fixed precision.
    ///
    /// Diagnostic/fatal: the affected span of the key space needs an
    /// out-of-band full renumbering pass; there is no inline recovery.
    #[error(
        "no distinct key exists between {prev} and {next} at {scale} fractional digits; \
         the tenant's key space needs renumbering"
    )]
    PrecisionExhausted {
        prev: PriorityKey,
        next: PriorityKey,
        scale: u32,
    },
}

/// Result type alias for ordering operations.
pub type OrderingResult<T> = Result<T, OrderingError>;

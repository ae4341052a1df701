//! Conflict resolution against a tenant's key set.
//!
//! Given a snapshot of a tenant's current keys, the any-source subset, and a
//! candidate, [`ConflictResolver`] decides whether the candidate collides with
//! or falls after the any-source block, and produces the minimal batch of key
//! re-assignments (the *bump*) needed to restore the invariant: every
//! any-source rule's key is greater than every regular rule's key.

use crate::error::{OrderingError, OrderingResult};
use crate::key::{PriorityKey, RuleId};
use crate::keyspace::PriorityKeySpace;

/// One rule's entry in a tenant key snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyedRule {
    /// The rule's store-assigned identity.
    pub id: RuleId,
    /// The rule's current priority key.
    pub key: PriorityKey,
    /// Whether the rule matches any source (empty source set).
    pub any_source: bool,
}

/// An immutable snapshot of one tenant's priority keys.
///
/// Construction sorts entries ascending by key, ties broken by id, so bump
/// order is deterministic regardless of how the snapshot was loaded.
#[derive(Debug, Clone, Default)]
pub struct TenantKeySet {
    rules: Vec<KeyedRule>,
}

impl TenantKeySet {
    /// Builds a snapshot from keyed rule entries.
    pub fn new(mut rules: Vec<KeyedRule>) -> Self {
        rules.sort_by(|a, b| a.key.cmp(&b.key).then(a.id.cmp(&b.id)));
        Self { rules }
    }

    /// Builds a snapshot from `(id, key, any_source)` triples.
    pub fn from_rules(rules: impl IntoIterator<Item = (RuleId, PriorityKey, bool)>) -> Self {
        Self::new(
            rules
                .into_iter()
                .map(|(id, key, any_source)| KeyedRule { id, key, any_source })
                .collect(),
        )
    }

    /// Returns `true` if the tenant has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of rules in the snapshot.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// All entries, ascending by key.
    pub fn iter(&self) -> impl Iterator<Item = &KeyedRule> {
        self.rules.iter()
    }

    /// The greatest key across all rules.
    pub fn max_key(&self) -> Option<PriorityKey> {
        self.rules.last().map(|r| r.key)
    }

    /// The greatest key among regular rules.
    pub fn max_regular_key(&self) -> Option<PriorityKey> {
        self.rules.iter().filter(|r| !r.any_source).map(|r| r.key).max()
    }

    /// The least key among any-source rules.
    pub fn min_any_source_key(&self) -> Option<PriorityKey> {
        self.rules.iter().filter(|r| r.any_source).map(|r| r.key).min()
    }

    /// Any-source entries, ascending by key (ties by id).
    pub fn any_source_rules(&self) -> impl Iterator<Item = &KeyedRule> {
        self.rules.iter().filter(|r| r.any_source)
    }

    fn has_regular_at(&self, key: PriorityKey) -> bool {
        self.rules.iter().any(|r| !r.any_source && r.key == key)
    }
}

/// The rule being placed, discriminated explicitly.
///
/// The persistence layer derives the variant from the emptiness of the rule's
/// source list; inside the engine the distinction is a tag, so the
/// empty-list-as-sentinel never has to be re-checked here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    /// A rule with an empty source set; always placed after every other rule.
    AnySource,
    /// A rule with a concrete source set, optionally asking for a specific key.
    Regular {
        /// A caller-requested key, if any.
        requested: Option<PriorityKey>,
    },
}

/// A key re-assignment for one existing rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBump {
    /// The rule whose key changes.
    pub id: RuleId,
    /// The rule's new key.
    pub key: PriorityKey,
}

/// The outcome of resolving a candidate: the key to persist for the new or
/// moved row, plus the bumped rows that must be written in the same atomic
/// unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Final key for the candidate rule.
    pub key: PriorityKey,
    /// Re-assignments for existing rules, in ascending new-key order.
    pub bumps: Vec<KeyBump>,
}

/// Resolves candidate keys against a tenant key snapshot.
///
/// Stateless; both the decision and the key computation are pure functions of
/// the snapshot, so a failed operation can be retried from a fresh read
/// without compensation logic.
#[derive(Debug, Clone, Copy)]
pub struct ConflictResolver;

impl ConflictResolver {
    /// Decides the final key for `candidate` and the bumps needed to keep the
    /// any-source block last.
    ///
    /// # Errors
    ///
    /// - [`OrderingError::PriorityConflict`] when an explicitly requested key
    ///   equals another regular rule's key.
    /// - [`OrderingError::PrecisionExhausted`] when no distinct key exists
    ///   between the regular block and the any-source block.
    pub fn resolve(keys: &TenantKeySet, candidate: Candidate) -> OrderingResult<Placement> {
        let (key, bumps) = match candidate {
            // An any-source rule goes after the current maximum across all
            // rules, which satisfies the invariant without touching anyone.
            Candidate::AnySource => {
                let key = keys
                    .max_key()
                    .map(|max| max.plus_one())
                    .unwrap_or_else(PriorityKey::start);
                (key, Vec::new())
            }

            Candidate::Regular { requested: Some(requested) } => {
                if keys.has_regular_at(requested) {
                    return Err(OrderingError::PriorityConflict { key: requested });
                }
                let bumps = match keys.min_any_source_key() {
                    Some(min_any) if requested >= min_any => bump_any_source(keys, requested),
                    _ => Vec::new(),
                };
                (requested, bumps)
            }

            // No explicit key: slot between the last regular rule and the
            // any-source block.
            Candidate::Regular { requested: None } => {
                let key =
                    PriorityKeySpace::between(keys.max_regular_key(), keys.min_any_source_key())?;
                (key, Vec::new())
            }
        };

        let key = ensure_unique(keys, key, &bumps);
        Ok(Placement { key, bumps })
    }
}

/// Re-assigns every any-source rule to consecutive keys starting one past the
/// candidate, preserving their relative order.
fn bump_any_source(keys: &TenantKeySet, candidate: PriorityKey) -> Vec<KeyBump> {
    let mut next = candidate.plus_one();
    keys.any_source_rules()
        .map(|rule| {
            let bump = KeyBump { id: rule.id, key: next };
            next = next.plus_one();
            bump
        })
        .collect()
}

/// Final safety net: if the computed key still collides with an occupied key
/// (only possible under precision exhaustion), step it by the smallest
/// representable increment until unique. This is an implicit bump of zero
/// rows, reported as a diagnostic.
fn ensure_unique(keys: &TenantKeySet, mut key: PriorityKey, bumps: &[KeyBump]) -> PriorityKey {
    let occupied = |key: PriorityKey| {
        keys.iter().any(|rule| {
            let effective = bumps
                .iter()
                .find(|b| b.id == rule.id)
                .map(|b| b.key)
                .unwrap_or(rule.key);
            effective == key
        })
    };

    let mut steps = 0u32;
    while occupied(key) {
        key = key.next_step();
        steps += 1;
    }
    if steps > 0 {
        tracing::warn!(
            %key,
            steps,
            "priority key collided with an occupied key; stepped to the next free slot"
        );
    }
    key
}

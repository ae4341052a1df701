//! The rule ordering service.
//!
//! [`RuleOrderingService`] is the entry point for rule creation and
//! repositioning. It owns the ordering invariant -- for a given tenant, every
//! any-source rule's key is greater than every regular rule's key -- by
//! orchestrating the key space and conflict resolver from
//! `palisade-ordering` over a [`RuleStore`].

use std::collections::HashMap;
use std::sync::Arc;

use palisade_ordering::key::{PriorityKey, RuleId};
use palisade_ordering::resolver::{Candidate, ConflictResolver, KeyBump, Placement, TenantKeySet};

use crate::core::RuleStore;
use crate::error::{StoreError, StoreResult};
use crate::tenant::TenantId;
use crate::types::{Rule, RuleDraft, RulePatch, RuleQuery, RulePage};

/// The outcome of creating a rule: the stored row plus the bumps that were
/// persisted alongside it.
#[derive(Debug, Clone)]
pub struct CreatedRule {
    /// The newly stored rule.
    pub rule: Rule,
    /// Key re-assignments applied to existing rules in the same atomic write.
    pub bumps: Vec<KeyBump>,
}

/// Per-tenant mutual exclusion for read-modify-write operations.
///
/// Two concurrent placements for the same tenant must not interleave their
/// read-of-all-keys and write-of-new-keys, or key uniqueness and the
/// any-source-last invariant can both be violated. Tenants do not contend
/// with each other.
#[derive(Debug, Default)]
struct TenantLocks {
    locks: parking_lot::Mutex<HashMap<TenantId, Arc<tokio::sync::Mutex<()>>>>,
}

impl TenantLocks {
    fn for_tenant(&self, tenant: &TenantId) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .lock()
            .entry(tenant.clone())
            .or_default()
            .clone()
    }
}

/// Orchestrates rule placement, reordering, and CRUD over a [`RuleStore`].
///
/// # Concurrency
///
/// `create` and `move_rule` hold a per-tenant critical section for the
/// duration of load-keys → resolve → write. Reads never take the lock.
/// Operations are short and bounded (one read plus a write batch no larger
/// than the tenant's any-source block) and are safe to retry from scratch on
/// failure, since placement decisions are pure functions of current state.
///
/// # Examples
///
/// ```no_run
/// use palisade_persistence::backends::memory::MemoryStore;
/// use palisade_persistence::service::RuleOrderingService;
/// use palisade_persistence::tenant::TenantId;
/// use palisade_persistence::types::{Destination, RuleAction, RuleDraft, Source};
///
/// # async fn example() -> Result<(), palisade_persistence::error::StoreError> {
/// let service = RuleOrderingService::new(MemoryStore::new());
/// let tenant = TenantId::new("acme");
///
/// let created = service
///     .create(&tenant, RuleDraft {
///         name: "allow office".into(),
///         action: RuleAction::Allow,
///         sources: vec![Source { name: "Office".into(), email: "net@acme.test".into() }],
///         destinations: vec![Destination { name: "DMZ".into(), address: "10.0.0.0/24".into() }],
///         priority: None,
///     })
///     .await?;
/// assert!(created.bumps.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RuleOrderingService<S> {
    store: S,
    locks: TenantLocks,
}

impl<S: RuleStore> RuleOrderingService<S> {
    /// Creates a service over the given store.
    pub fn new(store: S) -> Self {
        Self { store, locks: TenantLocks::default() }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Computes the placement for a prospective rule without persisting it.
    ///
    /// Returns the final key for the new row plus the bumps that must be
    /// written in the same transaction. Callers that persist through this
    /// service should use [`create`](Self::create) instead, which runs the
    /// same decision inside the tenant's critical section.
    pub async fn place(
        &self,
        tenant: &TenantId,
        any_source: bool,
        requested: Option<PriorityKey>,
    ) -> StoreResult<Placement> {
        let candidate = if any_source {
            Candidate::AnySource
        } else {
            Candidate::Regular { requested }
        };
        let keys = TenantKeySet::new(self.store.load_keys(tenant).await?);
        Ok(ConflictResolver::resolve(&keys, candidate)?)
    }

    /// Creates a rule, bumping the any-source block if the placement requires
    /// it. The new row and all bumps are persisted as one atomic unit.
    ///
    /// # Errors
    ///
    /// - [`OrderingError::PriorityConflict`](palisade_ordering::OrderingError::PriorityConflict)
    ///   when the draft requests a key already held by a regular rule. No
    ///   state changes.
    /// - [`OrderingError::PrecisionExhausted`](palisade_ordering::OrderingError::PrecisionExhausted)
    ///   when no key fits between the regular and any-source blocks.
    pub async fn create(&self, tenant: &TenantId, draft: RuleDraft) -> StoreResult<CreatedRule> {
        let lock = self.locks.for_tenant(tenant);
        let _guard = lock.lock().await;

        let keys = TenantKeySet::new(self.store.load_keys(tenant).await?);
        let placement = ConflictResolver::resolve(&keys, draft.candidate())?;
        tracing::debug!(
            %tenant,
            key = %placement.key,
            bumps = placement.bumps.len(),
            "placing rule"
        );

        let rule = self
            .store
            .insert(tenant, draft.into_new(placement.key), &placement.bumps)
            .await?;
        Ok(CreatedRule { rule, bumps: placement.bumps })
    }

    /// Repositions a rule to a caller-supplied key, typically the midpoint of
    /// its new neighbors computed client-side during a drag-and-drop.
    ///
    /// Only an existence check is performed: the supplied key is trusted
    /// positionally and the any-source relocation logic is *not* re-run. When
    /// the trusted key would leave the rule on the wrong side of the tenant's
    /// any-source block a warning is logged, making the invariant bypass
    /// observable without changing the write.
    pub async fn move_rule(
        &self,
        tenant: &TenantId,
        id: RuleId,
        new_key: PriorityKey,
    ) -> StoreResult<Rule> {
        let lock = self.locks.for_tenant(tenant);
        let _guard = lock.lock().await;

        let keys = TenantKeySet::new(self.store.load_keys(tenant).await?);
        let Some(moved) = keys.iter().find(|r| r.id == id).copied() else {
            return Err(StoreError::not_found(tenant, id));
        };
        warn_on_invariant_bypass(tenant, &keys, moved.any_source, id, new_key);

        self.store
            .set_priority(tenant, id, new_key)
            .await?
            .ok_or_else(|| StoreError::not_found(tenant, id))
    }

    /// Reads a rule.
    pub async fn get(&self, tenant: &TenantId, id: RuleId) -> StoreResult<Rule> {
        self.store
            .get(tenant, id)
            .await?
            .ok_or_else(|| StoreError::not_found(tenant, id))
    }

    /// Lists rules with filter, sort, and pagination.
    pub async fn list(&self, tenant: &TenantId, query: &RuleQuery) -> StoreResult<RulePage> {
        self.store.list(tenant, query).await
    }

    /// Applies a payload edit. Priority is untouched; use
    /// [`move_rule`](Self::move_rule) to reorder.
    pub async fn update(
        &self,
        tenant: &TenantId,
        id: RuleId,
        patch: &RulePatch,
    ) -> StoreResult<Rule> {
        self.store
            .update(tenant, id, patch)
            .await?
            .ok_or_else(|| StoreError::not_found(tenant, id))
    }

    /// Deletes a rule. The freed key is simply absent from future placements;
    /// no compaction happens.
    pub async fn delete(&self, tenant: &TenantId, id: RuleId) -> StoreResult<()> {
        if self.store.delete(tenant, id).await? {
            Ok(())
        } else {
            Err(StoreError::not_found(tenant, id))
        }
    }
}

/// Logs when a trusted `move` key violates the any-source-last invariant.
fn warn_on_invariant_bypass(
    tenant: &TenantId,
    keys: &TenantKeySet,
    moved_any_source: bool,
    id: RuleId,
    new_key: PriorityKey,
) {
    if moved_any_source {
        let max_regular = keys
            .iter()
            .filter(|r| !r.any_source && r.id != id)
            .map(|r| r.key)
            .max();
        if max_regular.is_some_and(|max| new_key <= max) {
            tracing::warn!(
                %tenant, %id, key = %new_key,
                "any-source rule moved before a regular rule; ordering invariant bypassed"
            );
        }
    } else {
        let min_any = keys
            .iter()
            .filter(|r| r.any_source && r.id != id)
            .map(|r| r.key)
            .min();
        if min_any.is_some_and(|min| new_key >= min) {
            tracing::warn!(
                %tenant, %id, key = %new_key,
                "regular rule moved past the any-source block; ordering invariant bypassed"
            );
        }
    }
}

//! Core rule storage trait.
//!
//! [`RuleStore`] is the boundary between the ordering service and the
//! persistence technology. Every operation takes a [`TenantId`]; there is no
//! escape hatch around tenant scoping.

use async_trait::async_trait;
use palisade_ordering::key::{PriorityKey, RuleId};
use palisade_ordering::resolver::{KeyBump, KeyedRule};

use crate::error::StoreResult;
use crate::tenant::TenantId;
use crate::types::{NewRule, Rule, RulePatch, RuleQuery, RulePage};

/// Storage backend for firewall rules.
///
/// # Atomicity
///
/// [`insert`](RuleStore::insert) writes the primary row *and* all bump rows as
/// one atomic unit. A partial bump (some any-source rows re-keyed, others not)
/// would leave the any-source-last invariant violated, so a failed insert must
/// leave the tenant's rows untouched; the whole placement is then retried from
/// a fresh read.
///
/// # Serialization
///
/// The store itself does not serialize concurrent writers; the ordering
/// service holds a per-tenant critical section for the duration of
/// load-keys → resolve → write.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Returns a human-readable name for this storage backend.
    fn backend_name(&self) -> &'static str;

    /// Inserts a new rule and applies the given bumps atomically.
    ///
    /// Returns the stored rule with its assigned identity.
    async fn insert(
        &self,
        tenant: &TenantId,
        rule: NewRule,
        bumps: &[KeyBump],
    ) -> StoreResult<Rule>;

    /// Loads the tenant's `(id, key, any_source)` triples, ascending by key.
    ///
    /// This is the read side of every placement decision.
    async fn load_keys(&self, tenant: &TenantId) -> StoreResult<Vec<KeyedRule>>;

    /// Reads a rule by id.
    async fn get(&self, tenant: &TenantId, id: RuleId) -> StoreResult<Option<Rule>>;

    /// Lists rules matching a query, with filter, sort, and pagination.
    async fn list(&self, tenant: &TenantId, query: &RuleQuery) -> StoreResult<RulePage>;

    /// Applies a payload edit to a rule. Never touches the priority key.
    ///
    /// Returns the updated rule, or `None` if the rule does not exist.
    async fn update(
        &self,
        tenant: &TenantId,
        id: RuleId,
        patch: &RulePatch,
    ) -> StoreResult<Option<Rule>>;

    /// Rewrites a rule's priority key.
    ///
    /// Returns the updated rule, or `None` if the rule does not exist.
    async fn set_priority(
        &self,
        tenant: &TenantId,
        id: RuleId,
        priority: PriorityKey,
    ) -> StoreResult<Option<Rule>>;

    /// Deletes a rule. Returns `true` if a rule was removed.
    ///
    /// No key compaction happens on delete; the freed key simply stops
    /// participating in future placements.
    async fn delete(&self, tenant: &TenantId, id: RuleId) -> StoreResult<bool>;
}

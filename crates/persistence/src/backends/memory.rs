//! In-memory rule store.
//!
//! Keeps every tenant's rules in a process-local map. Used as the reference
//! backend in tests and for embedding without a database file.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use palisade_ordering::key::{PriorityKey, RuleId};
use palisade_ordering::resolver::{KeyBump, KeyedRule};
use parking_lot::RwLock;

use crate::core::RuleStore;
use crate::error::StoreResult;
use crate::tenant::TenantId;
use crate::types::{NewRule, Rule, RulePatch, RuleQuery, RulePage};

/// An in-memory [`RuleStore`].
///
/// All mutations for a tenant happen under one write lock, so an insert with
/// bumps is trivially atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tenants: RwLock<HashMap<TenantId, Vec<Rule>>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            tenants: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn allocate_id(&self) -> RuleId {
        RuleId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

#[async_trait]
impl RuleStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn insert(
        &self,
        tenant: &TenantId,
        rule: NewRule,
        bumps: &[KeyBump],
    ) -> StoreResult<Rule> {
        let id = self.allocate_id();
        let stored = Rule::new(
            id,
            tenant.clone(),
            rule.priority,
            rule.name,
            rule.action,
            rule.sources,
            rule.destinations,
        );

        let mut tenants = self.tenants.write();
        let rows = tenants.entry(tenant.clone()).or_default();
        for bump in bumps {
            if let Some(row) = rows.iter_mut().find(|r| r.id() == bump.id) {
                row.set_priority(bump.key);
            }
        }
        rows.push(stored.clone());
        Ok(stored)
    }

    async fn load_keys(&self, tenant: &TenantId) -> StoreResult<Vec<KeyedRule>> {
        let tenants = self.tenants.read();
        let mut keys: Vec<KeyedRule> = tenants
            .get(tenant)
            .map(|rows| {
                rows.iter()
                    .map(|r| KeyedRule {
                        id: r.id(),
                        key: r.priority(),
                        any_source: r.is_any_source(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        keys.sort_by(|a, b| a.key.cmp(&b.key).then(a.id.cmp(&b.id)));
        Ok(keys)
    }

    async fn get(&self, tenant: &TenantId, id: RuleId) -> StoreResult<Option<Rule>> {
        let tenants = self.tenants.read();
        Ok(tenants
            .get(tenant)
            .and_then(|rows| rows.iter().find(|r| r.id() == id).cloned()))
    }

    async fn list(&self, tenant: &TenantId, query: &RuleQuery) -> StoreResult<RulePage> {
        let tenants = self.tenants.read();
        let mut matched: Vec<Rule> = tenants
            .get(tenant)
            .map(|rows| {
                rows.iter()
                    .filter(|r| query.filter.as_ref().map_or(true, |f| f.matches(r)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        query.sort(&mut matched);
        let total = matched.len() as u64;
        let rules = matched
            .into_iter()
            .skip(query.pagination.offset as usize)
            .take(query.pagination.limit as usize)
            .collect();
        Ok(RulePage { rules, total })
    }

    async fn update(
        &self,
        tenant: &TenantId,
        id: RuleId,
        patch: &RulePatch,
    ) -> StoreResult<Option<Rule>> {
        let mut tenants = self.tenants.write();
        Ok(tenants.get_mut(tenant).and_then(|rows| {
            rows.iter_mut().find(|r| r.id() == id).map(|row| {
                row.apply(patch);
                row.clone()
            })
        }))
    }

    async fn set_priority(
        &self,
        tenant: &TenantId,
        id: RuleId,
        priority: PriorityKey,
    ) -> StoreResult<Option<Rule>> {
        let mut tenants = self.tenants.write();
        Ok(tenants.get_mut(tenant).and_then(|rows| {
            rows.iter_mut().find(|r| r.id() == id).map(|row| {
                row.set_priority(priority);
                row.clone()
            })
        }))
    }

    async fn delete(&self, tenant: &TenantId, id: RuleId) -> StoreResult<bool> {
        let mut tenants = self.tenants.write();
        Ok(tenants
            .get_mut(tenant)
            .map(|rows| {
                let before = rows.len();
                rows.retain(|r| r.id() != id);
                rows.len() < before
            })
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Destination, RuleAction, Source};

    fn draft(name: &str, priority: i64) -> NewRule {
        NewRule {
            name: name.into(),
            action: RuleAction::Allow,
            sources: vec![Source { name: "s".into(), email: "s@t.test".into() }],
            destinations: vec![Destination { name: "d".into(), address: "addr".into() }],
            priority: PriorityKey::from_int(priority),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_monotonic_ids() {
        let store = MemoryStore::new();
        let tenant = TenantId::new("t1");
        let a = store.insert(&tenant, draft("a", 1), &[]).await.unwrap();
        let b = store.insert(&tenant, draft("b", 2), &[]).await.unwrap();
        assert!(a.id() < b.id());
    }

    #[tokio::test]
    async fn test_insert_applies_bumps_atomically() {
        let store = MemoryStore::new();
        let tenant = TenantId::new("t1");
        let existing = store.insert(&tenant, draft("old", 3), &[]).await.unwrap();

        let bumps = [KeyBump { id: existing.id(), key: PriorityKey::from_int(4) }];
        store.insert(&tenant, draft("new", 3), &bumps).await.unwrap();

        let moved = store.get(&tenant, existing.id()).await.unwrap().unwrap();
        assert_eq!(moved.priority(), PriorityKey::from_int(4));
    }

    #[tokio::test]
    async fn test_load_keys_sorted_ascending() {
        let store = MemoryStore::new();
        let tenant = TenantId::new("t1");
        store.insert(&tenant, draft("b", 5), &[]).await.unwrap();
        store.insert(&tenant, draft("a", 2), &[]).await.unwrap();

        let keys = store.load_keys(&tenant).await.unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys[0].key < keys[1].key);
    }

    #[tokio::test]
    async fn test_tenants_are_isolated() {
        let store = MemoryStore::new();
        let t1 = TenantId::new("t1");
        let t2 = TenantId::new("t2");
        store.insert(&t1, draft("a", 1), &[]).await.unwrap();

        assert!(store.load_keys(&t2).await.unwrap().is_empty());
        let page = store.list(&t2, &RuleQuery::new()).await.unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_delete_missing_returns_false() {
        let store = MemoryStore::new();
        let tenant = TenantId::new("t1");
        assert!(!store.delete(&tenant, RuleId::new(99)).await.unwrap());
    }
}

//! SQLite backend integration tests.
//!
//! These verify the SQLite store against the `RuleStore` contract and the
//! ordering service end to end, including atomicity of insert + bumps and
//! durability across reopen.

#![cfg(feature = "sqlite")]

use palisade_ordering::key::PriorityKey;
use palisade_ordering::resolver::KeyBump;
use palisade_persistence::backends::sqlite::SqliteBackend;
use palisade_persistence::core::RuleStore;
use palisade_persistence::service::RuleOrderingService;
use palisade_persistence::tenant::TenantId;
use palisade_persistence::types::{
    Destination, NewRule, RuleAction, RuleDraft, RuleFilter, RulePatch, RuleQuery, SortKey,
    SortOrder, Source,
};

fn create_backend() -> SqliteBackend {
    SqliteBackend::in_memory().expect("Failed to create SQLite backend")
}

fn new_rule(name: &str, priority: i64, sources: Vec<Source>) -> NewRule {
    NewRule {
        name: name.into(),
        action: RuleAction::Allow,
        sources,
        destinations: vec![Destination { name: "DMZ".into(), address: "10.0.0.0/24".into() }],
        priority: PriorityKey::from_int(priority),
    }
}

fn office() -> Vec<Source> {
    vec![Source { name: "Office".into(), email: "net@office.test".into() }]
}

// ============================================================================
// Store contract
// ============================================================================

#[tokio::test]
async fn test_insert_and_get_roundtrip() {
    let backend = create_backend();
    let tenant = TenantId::new("t1");

    let stored = backend
        .insert(&tenant, new_rule("office to dmz", 1, office()), &[])
        .await
        .unwrap();

    let read = backend.get(&tenant, stored.id()).await.unwrap().unwrap();
    assert_eq!(read, stored);
    assert_eq!(read.name(), "office to dmz");
    assert_eq!(read.priority(), PriorityKey::from_int(1));
    assert!(!read.is_any_source());
}

#[tokio::test]
async fn test_fractional_priority_survives_storage_exactly() {
    let backend = create_backend();
    let tenant = TenantId::new("t1");

    let key: PriorityKey = "2.531441".parse().unwrap();
    let stored = backend
        .insert(
            &tenant,
            NewRule { priority: key, ..new_rule("r", 0, office()) },
            &[],
        )
        .await
        .unwrap();

    let read = backend.get(&tenant, stored.id()).await.unwrap().unwrap();
    assert_eq!(read.priority(), key);
}

#[tokio::test]
async fn test_insert_applies_bumps_in_same_transaction() {
    let backend = create_backend();
    let tenant = TenantId::new("t1");

    let catch_all = backend
        .insert(&tenant, new_rule("deny rest", 3, vec![]), &[])
        .await
        .unwrap();

    let bumps = [KeyBump { id: catch_all.id(), key: PriorityKey::from_int(4) }];
    backend
        .insert(&tenant, new_rule("between", 3, office()), &bumps)
        .await
        .unwrap();

    let keys = backend.load_keys(&tenant).await.unwrap();
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0].key, PriorityKey::from_int(3));
    assert!(!keys[0].any_source);
    assert_eq!(keys[1].key, PriorityKey::from_int(4));
    assert!(keys[1].any_source);
}

#[tokio::test]
async fn test_load_keys_flags_any_source_rows() {
    let backend = create_backend();
    let tenant = TenantId::new("t1");

    backend.insert(&tenant, new_rule("r", 1, office()), &[]).await.unwrap();
    backend.insert(&tenant, new_rule("deny", 2, vec![]), &[]).await.unwrap();

    let keys = backend.load_keys(&tenant).await.unwrap();
    assert_eq!(keys.iter().filter(|k| k.any_source).count(), 1);
}

#[tokio::test]
async fn test_update_and_delete() {
    let backend = create_backend();
    let tenant = TenantId::new("t1");

    let stored = backend.insert(&tenant, new_rule("r", 1, office()), &[]).await.unwrap();

    let updated = backend
        .update(&tenant, stored.id(), &RulePatch {
            name: Some("renamed".into()),
            ..Default::default()
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.name(), "renamed");
    assert_eq!(updated.priority(), stored.priority());

    assert!(backend.delete(&tenant, stored.id()).await.unwrap());
    assert!(!backend.delete(&tenant, stored.id()).await.unwrap());
    assert!(backend.get(&tenant, stored.id()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_pushes_name_and_action_filters_to_sql() {
    let backend = create_backend();
    let tenant = TenantId::new("t1");

    backend
        .insert(&tenant, new_rule("Allow Office", 1, office()), &[])
        .await
        .unwrap();
    backend
        .insert(
            &tenant,
            NewRule { action: RuleAction::Block, ..new_rule("Block Guests", 2, office()) },
            &[],
        )
        .await
        .unwrap();

    let by_name = backend
        .list(&tenant, &RuleQuery::new().with_filter(RuleFilter::Name("office".into())))
        .await
        .unwrap();
    assert_eq!(by_name.total, 1);
    assert_eq!(by_name.rules[0].name(), "Allow Office");

    let by_action = backend
        .list(
            &tenant,
            &RuleQuery::new().with_filter(RuleFilter::Action(RuleAction::Block)),
        )
        .await
        .unwrap();
    assert_eq!(by_action.total, 1);
}

#[tokio::test]
async fn test_list_scans_descriptor_filters_in_memory() {
    let backend = create_backend();
    let tenant = TenantId::new("t1");

    backend.insert(&tenant, new_rule("a", 1, office()), &[]).await.unwrap();
    backend
        .insert(
            &tenant,
            new_rule(
                "b",
                2,
                vec![Source { name: "Warehouse".into(), email: "wh@site.test".into() }],
            ),
            &[],
        )
        .await
        .unwrap();

    let page = backend
        .list(
            &tenant,
            &RuleQuery::new().with_filter(RuleFilter::Sources("warehouse".into())),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.rules[0].name(), "b");

    let page = backend
        .list(
            &tenant,
            &RuleQuery::new().with_filter(RuleFilter::Destinations("10.0".into())),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 2);
}

#[tokio::test]
async fn test_list_sorts_and_paginates() {
    let backend = create_backend();
    let tenant = TenantId::new("t1");

    for (name, priority) in [("c", 3), ("a", 1), ("b", 2)] {
        backend.insert(&tenant, new_rule(name, priority, office()), &[]).await.unwrap();
    }

    let desc = backend
        .list(
            &tenant,
            &RuleQuery::new().with_sort(SortKey::Priority, SortOrder::Desc),
        )
        .await
        .unwrap();
    assert_eq!(desc.rules[0].name(), "c");

    let by_name = backend
        .list(
            &tenant,
            &RuleQuery::new().with_sort(SortKey::Name, SortOrder::Asc).with_page(1, 1),
        )
        .await
        .unwrap();
    assert_eq!(by_name.total, 3);
    assert_eq!(by_name.rules.len(), 1);
    assert_eq!(by_name.rules[0].name(), "b");
}

#[tokio::test]
async fn test_tenant_scoping_in_sql() {
    let backend = create_backend();
    let t1 = TenantId::new("t1");
    let t2 = TenantId::new("t2");

    backend.insert(&t1, new_rule("r", 1, office()), &[]).await.unwrap();

    assert!(backend.load_keys(&t2).await.unwrap().is_empty());
    assert_eq!(backend.list(&t2, &RuleQuery::new()).await.unwrap().total, 0);
}

// ============================================================================
// Service end to end
// ============================================================================

#[tokio::test]
async fn test_service_end_to_end_bump_scenario() {
    // Regular rules at [1, 2], any-source rule at 3; creating a regular rule
    // at 3 ends with regular [1, 2, 3] and the any-source rule at 4.
    let service = RuleOrderingService::new(create_backend());
    let tenant = TenantId::new("acme");

    for (name, priority) in [("a", 1), ("b", 2)] {
        service
            .create(&tenant, RuleDraft {
                name: name.into(),
                action: RuleAction::Allow,
                sources: office(),
                destinations: vec![Destination { name: "DMZ".into(), address: "*".into() }],
                priority: Some(PriorityKey::from_int(priority)),
            })
            .await
            .unwrap();
    }
    service
        .create(&tenant, RuleDraft {
            name: "deny rest".into(),
            action: RuleAction::Block,
            sources: vec![],
            destinations: vec![Destination { name: "all".into(), address: "*".into() }],
            priority: None,
        })
        .await
        .unwrap();

    let created = service
        .create(&tenant, RuleDraft {
            name: "c".into(),
            action: RuleAction::Allow,
            sources: office(),
            destinations: vec![Destination { name: "DMZ".into(), address: "*".into() }],
            priority: Some(PriorityKey::from_int(3)),
        })
        .await
        .unwrap();
    assert_eq!(created.rule.priority(), PriorityKey::from_int(3));
    assert_eq!(created.bumps.len(), 1);

    let page = service.list(&tenant, &RuleQuery::new()).await.unwrap();
    let keys: Vec<PriorityKey> = page.rules.iter().map(|r| r.priority()).collect();
    let expected: Vec<PriorityKey> = (1..=4).map(PriorityKey::from_int).collect();
    assert_eq!(keys, expected);
    assert!(page.rules.last().unwrap().is_any_source());
}

#[tokio::test]
async fn test_rules_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.db");
    let tenant = TenantId::new("t1");

    {
        let backend = SqliteBackend::open(&path).unwrap();
        backend.insert(&tenant, new_rule("durable", 1, office()), &[]).await.unwrap();
    }

    let backend = SqliteBackend::open(&path).unwrap();
    let page = backend.list(&tenant, &RuleQuery::new()).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.rules[0].name(), "durable");
}

//! RuleStore implementation for SQLite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use palisade_ordering::key::{PriorityKey, RuleId};
use palisade_ordering::resolver::{KeyBump, KeyedRule};
use rusqlite::{Connection, ToSql, params};

use crate::core::RuleStore;
use crate::error::{BackendError, StoreError, StoreResult};
use crate::tenant::TenantId;
use crate::types::{Destination, NewRule, Rule, RuleFilter, RulePatch, RuleQuery, RulePage, Source};

use super::SqliteBackend;

fn serialization_error(message: String) -> StoreError {
    StoreError::Backend(BackendError::SerializationError { message })
}

fn parse_priority(text: &str) -> StoreResult<PriorityKey> {
    text.parse()
        .map_err(|e| serialization_error(format!("invalid priority key '{text}': {e}")))
}

fn parse_timestamp(text: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| serialization_error(format!("invalid timestamp '{text}': {e}")))
}

/// Raw column values of one `rules` row, before domain conversion.
struct RawRow {
    id: i64,
    tenant_id: String,
    priority: String,
    name: String,
    action: String,
    sources: String,
    destinations: String,
    created_at: String,
    last_modified: String,
}

impl RawRow {
    fn into_rule(self) -> StoreResult<Rule> {
        let sources: Vec<Source> = serde_json::from_str(&self.sources)?;
        let destinations: Vec<Destination> = serde_json::from_str(&self.destinations)?;
        let action = self
            .action
            .parse()
            .map_err(|e: String| serialization_error(e))?;
        Ok(Rule::from_storage(
            RuleId::new(self.id),
            TenantId::new(self.tenant_id),
            parse_priority(&self.priority)?,
            self.name,
            action,
            sources,
            destinations,
            parse_timestamp(&self.created_at)?,
            parse_timestamp(&self.last_modified)?,
        ))
    }
}

const SELECT_COLUMNS: &str = "id, tenant_id, priority, name, action, sources, destinations, \
                              created_at, last_modified";

fn query_rules(conn: &Connection, sql: &str, params: &[&dyn ToSql]) -> StoreResult<Vec<Rule>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut rules = Vec::new();
    while let Some(row) = rows.next()? {
        let raw = RawRow {
            id: row.get(0)?,
            tenant_id: row.get(1)?,
            priority: row.get(2)?,
            name: row.get(3)?,
            action: row.get(4)?,
            sources: row.get(5)?,
            destinations: row.get(6)?,
            created_at: row.get(7)?,
            last_modified: row.get(8)?,
        };
        rules.push(raw.into_rule()?);
    }
    Ok(rules)
}

#[async_trait]
impl RuleStore for SqliteBackend {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn insert(
        &self,
        tenant: &TenantId,
        rule: NewRule,
        bumps: &[KeyBump],
    ) -> StoreResult<Rule> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;

        let now = Utc::now();
        let now_text = now.to_rfc3339();

        // Bump writes and the primary insert are one atomic unit; a partial
        // bump would leave the any-source block straddling the new rule.
        for bump in bumps {
            tx.execute(
                "UPDATE rules SET priority = ?1, last_modified = ?2
                 WHERE tenant_id = ?3 AND id = ?4",
                params![
                    bump.key.to_string(),
                    now_text,
                    tenant.as_str(),
                    bump.id.as_i64()
                ],
            )?;
        }

        let sources = serde_json::to_string(&rule.sources)?;
        let destinations = serde_json::to_string(&rule.destinations)?;
        tx.execute(
            "INSERT INTO rules (tenant_id, priority, name, action, sources, destinations, \
             created_at, last_modified)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                tenant.as_str(),
                rule.priority.to_string(),
                rule.name,
                rule.action.as_str(),
                sources,
                destinations,
                now_text,
                now_text
            ],
        )?;
        let id = RuleId::new(tx.last_insert_rowid());
        tx.commit()?;

        tracing::debug!(%tenant, %id, priority = %rule.priority, bumps = bumps.len(), "rule inserted");
        Ok(Rule::from_storage(
            id,
            tenant.clone(),
            rule.priority,
            rule.name,
            rule.action,
            rule.sources,
            rule.destinations,
            now,
            now,
        ))
    }

    async fn load_keys(&self, tenant: &TenantId) -> StoreResult<Vec<KeyedRule>> {
        let conn = self.get_connection()?;
        let mut stmt =
            conn.prepare("SELECT id, priority, sources FROM rules WHERE tenant_id = ?1")?;
        let mut rows = stmt.query(params![tenant.as_str()])?;

        let mut keys = Vec::new();
        while let Some(row) = rows.next()? {
            let id: i64 = row.get(0)?;
            let priority: String = row.get(1)?;
            let sources: String = row.get(2)?;
            let sources: Vec<Source> = serde_json::from_str(&sources)?;
            keys.push(KeyedRule {
                id: RuleId::new(id),
                key: parse_priority(&priority)?,
                any_source: sources.is_empty(),
            });
        }
        keys.sort_by(|a, b| a.key.cmp(&b.key).then(a.id.cmp(&b.id)));
        Ok(keys)
    }

    async fn get(&self, tenant: &TenantId, id: RuleId) -> StoreResult<Option<Rule>> {
        let conn = self.get_connection()?;
        let sql = format!("SELECT {SELECT_COLUMNS} FROM rules WHERE tenant_id = ?1 AND id = ?2");
        let mut rules = query_rules(&conn, &sql, &[&tenant.as_str(), &id.as_i64()])?;
        Ok(rules.pop())
    }

    async fn list(&self, tenant: &TenantId, query: &RuleQuery) -> StoreResult<RulePage> {
        let conn = self.get_connection()?;

        // Name and action filters are pushed to SQL; source/destination
        // filters are substring scans inside JSON columns and are evaluated
        // in memory over the tenant's rows.
        let mut matched = match &query.filter {
            Some(RuleFilter::Name(needle)) => {
                let sql = format!(
                    "SELECT {SELECT_COLUMNS} FROM rules \
                     WHERE tenant_id = ?1 AND name LIKE ?2"
                );
                let pattern = format!("%{needle}%");
                query_rules(&conn, &sql, &[&tenant.as_str(), &pattern])?
            }
            Some(RuleFilter::Action(action)) => {
                let sql = format!(
                    "SELECT {SELECT_COLUMNS} FROM rules \
                     WHERE tenant_id = ?1 AND action = ?2"
                );
                query_rules(&conn, &sql, &[&tenant.as_str(), &action.as_str()])?
            }
            _ => {
                let sql = format!("SELECT {SELECT_COLUMNS} FROM rules WHERE tenant_id = ?1");
                query_rules(&conn, &sql, &[&tenant.as_str()])?
            }
        };

        if let Some(filter @ (RuleFilter::Sources(_) | RuleFilter::Destinations(_))) =
            &query.filter
        {
            matched.retain(|rule| filter.matches(rule));
        }

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
        let Some(mut rule) = self.get(tenant, id).await? else {
            return Ok(None);
        };
        rule.apply(patch);

        let conn = self.get_connection()?;
        conn.execute(
            "UPDATE rules SET name = ?1, action = ?2, sources = ?3, destinations = ?4, \
             last_modified = ?5
             WHERE tenant_id = ?6 AND id = ?7",
            params![
                rule.name(),
                rule.action().as_str(),
                serde_json::to_string(rule.sources())?,
                serde_json::to_string(rule.destinations())?,
                rule.last_modified().to_rfc3339(),
                tenant.as_str(),
                id.as_i64()
            ],
        )?;
        Ok(Some(rule))
    }

    async fn set_priority(
        &self,
        tenant: &TenantId,
        id: RuleId,
        priority: PriorityKey,
    ) -> StoreResult<Option<Rule>> {
        let conn = self.get_connection()?;
        let changed = conn.execute(
            "UPDATE rules SET priority = ?1, last_modified = ?2
             WHERE tenant_id = ?3 AND id = ?4",
            params![
                priority.to_string(),
                Utc::now().to_rfc3339(),
                tenant.as_str(),
                id.as_i64()
            ],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        drop(conn);
        self.get(tenant, id).await
    }

    async fn delete(&self, tenant: &TenantId, id: RuleId) -> StoreResult<bool> {
        let conn = self.get_connection()?;
        let changed = conn.execute(
            "DELETE FROM rules WHERE tenant_id = ?1 AND id = ?2",
            params![tenant.as_str(), id.as_i64()],
        )?;
        Ok(changed > 0)
    }
}

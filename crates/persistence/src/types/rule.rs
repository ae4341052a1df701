//! The stored rule model.
//!
//! A [`Rule`] is a firewall-style policy entry: a name, an [`RuleAction`], a
//! set of source and destination descriptors, and a [`PriorityKey`] that fixes
//! its place in the tenant's evaluation order. A rule whose source list is
//! empty matches *any* source; that emptiness is the discriminator, not a
//! separate flag.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use palisade_ordering::key::{PriorityKey, RuleId};
use palisade_ordering::resolver::Candidate;
use serde::{Deserialize, Serialize};

use crate::tenant::TenantId;

/// A source descriptor: who traffic may come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Display name of the source.
    pub name: String,
    /// Contact or account email of the source.
    pub email: String,
}

/// A destination descriptor: where traffic may go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    /// Display name of the destination.
    pub name: String,
    /// Network address of the destination.
    pub address: String,
}

/// What a rule does when it matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleAction {
    /// Permit the traffic.
    Allow,
    /// Reject the traffic.
    Block,
}

impl RuleAction {
    /// Returns the action as its canonical string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleAction::Allow => "Allow",
            RuleAction::Block => "Block",
        }
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Allow" => Ok(RuleAction::Allow),
            "Block" => Ok(RuleAction::Block),
            other => Err(format!("unknown rule action: {other}")),
        }
    }
}

/// A stored firewall rule with persistence metadata.
///
/// Identity (`id`) is assigned by the store and immutable. The priority key
/// may be rewritten by the ordering service as a side effect of another rule's
/// placement (a *bump*); everything else changes only through explicit edits.
///
/// # Examples
///
/// ```
/// use palisade_ordering::key::{PriorityKey, RuleId};
/// use palisade_persistence::tenant::TenantId;
/// use palisade_persistence::types::{Rule, RuleAction};
///
/// let rule = Rule::new(
///     RuleId::new(1),
///     TenantId::new("acme"),
///     PriorityKey::from_int(1),
///     "allow office",
///     RuleAction::Allow,
///     vec![],
///     vec![],
/// );
/// assert!(rule.is_any_source());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    id: RuleId,
    tenant_id: TenantId,
    priority: PriorityKey,
    name: String,
    action: RuleAction,
    sources: Vec<Source>,
    destinations: Vec<Destination>,
    created_at: DateTime<Utc>,
    last_modified: DateTime<Utc>,
}

impl Rule {
    /// Creates a new rule with fresh timestamps.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: RuleId,
        tenant_id: TenantId,
        priority: PriorityKey,
        name: impl Into<String>,
        action: RuleAction,
        sources: Vec<Source>,
        destinations: Vec<Destination>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            tenant_id,
            priority,
            name: name.into(),
            action,
            sources,
            destinations,
            created_at: now,
            last_modified: now,
        }
    }

    /// Reconstructs a rule from stored fields, preserving timestamps.
    #[allow(clippy::too_many_arguments)]
    pub fn from_storage(
        id: RuleId,
        tenant_id: TenantId,
        priority: PriorityKey,
        name: String,
        action: RuleAction,
        sources: Vec<Source>,
        destinations: Vec<Destination>,
        created_at: DateTime<Utc>,
        last_modified: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            tenant_id,
            priority,
            name,
            action,
            sources,
            destinations,
            created_at,
            last_modified,
        }
    }

    /// The store-assigned rule identity.
    pub fn id(&self) -> RuleId {
        self.id
    }

    /// The tenant that owns this rule.
    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    /// The rule's priority key (evaluation order ascending).
    pub fn priority(&self) -> PriorityKey {
        self.priority
    }

    /// The rule's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The rule's action.
    pub fn action(&self) -> RuleAction {
        self.action
    }

    /// The rule's source descriptors.
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// The rule's destination descriptors.
    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    /// When the rule was first created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the rule was last modified.
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    /// Returns `true` if this rule matches any source (empty source set).
    pub fn is_any_source(&self) -> bool {
        self.sources.is_empty()
    }

    /// Applies a partial edit, refreshing `last_modified`.
    ///
    /// Priority is deliberately absent from [`RulePatch`]; key changes go
    /// through the ordering service.
    pub fn apply(&mut self, patch: &RulePatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(action) = patch.action {
            self.action = action;
        }
        if let Some(sources) = &patch.sources {
            self.sources = sources.clone();
        }
        if let Some(destinations) = &patch.destinations {
            self.destinations = destinations.clone();
        }
        self.last_modified = Utc::now();
    }

    /// Rewrites the priority key, refreshing `last_modified`.
    pub fn set_priority(&mut self, priority: PriorityKey) {
        self.priority = priority;
        self.last_modified = Utc::now();
    }
}

/// The payload for creating a rule.
///
/// `priority` is the caller-requested key, if any; the ordering service is
/// free to refuse it ([`PriorityConflict`](palisade_ordering::OrderingError))
/// or to bump other rules to honor it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDraft {
    /// Display name.
    pub name: String,
    /// Action to take on match.
    pub action: RuleAction,
    /// Source descriptors; empty means any source.
    pub sources: Vec<Source>,
    /// Destination descriptors.
    pub destinations: Vec<Destination>,
    /// Caller-requested priority key, if any.
    #[serde(default)]
    pub priority: Option<PriorityKey>,
}

impl RuleDraft {
    /// Returns `true` if the draft describes an any-source rule.
    pub fn is_any_source(&self) -> bool {
        self.sources.is_empty()
    }

    /// The ordering-engine view of this draft.
    pub fn candidate(&self) -> Candidate {
        if self.is_any_source() {
            Candidate::AnySource
        } else {
            Candidate::Regular { requested: self.priority }
        }
    }

    /// Converts the draft into an insertable row with its resolved final key.
    pub fn into_new(self, priority: PriorityKey) -> NewRule {
        NewRule {
            name: self.name,
            action: self.action,
            sources: self.sources,
            destinations: self.destinations,
            priority,
        }
    }
}

/// A rule ready for insertion: a draft with its resolved priority key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRule {
    /// Display name.
    pub name: String,
    /// Action to take on match.
    pub action: RuleAction,
    /// Source descriptors.
    pub sources: Vec<Source>,
    /// Destination descriptors.
    pub destinations: Vec<Destination>,
    /// The final priority key to persist.
    pub priority: PriorityKey,
}

/// A partial edit of a rule's payload.
///
/// Absent fields are left untouched. Priority cannot be edited here; reorder
/// operations go through
/// [`RuleOrderingService::move_rule`](crate::service::RuleOrderingService::move_rule).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulePatch {
    /// New display name.
    #[serde(default)]
    pub name: Option<String>,
    /// New action.
    #[serde(default)]
    pub action: Option<RuleAction>,
    /// New source descriptors (may become empty, turning the rule any-source).
    #[serde(default)]
    pub sources: Option<Vec<Source>>,
    /// New destination descriptors.
    #[serde(default)]
    pub destinations: Option<Vec<Destination>>,
}

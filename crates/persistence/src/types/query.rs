//! Query, filter, and pagination types for listing rules.
//!
//! Name and action filters are cheap and can be pushed down to a SQL backend;
//! source/destination filters are substring scans over every string field of
//! every descriptor and are evaluated in memory over the tenant's rows.

use serde::{Deserialize, Serialize};

use super::rule::{Rule, RuleAction};

/// A filter over rule attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RuleFilter {
    /// Case-insensitive substring match on the rule name.
    Name(String),
    /// Exact action match.
    Action(RuleAction),
    /// Case-insensitive substring match over all source descriptor fields.
    Sources(String),
    /// Case-insensitive substring match over all destination descriptor fields.
    Destinations(String),
}

impl RuleFilter {
    /// Evaluates the filter against a rule in memory.
    pub fn matches(&self, rule: &Rule) -> bool {
        fn contains(haystack: &str, needle: &str) -> bool {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        }

        match self {
            RuleFilter::Name(needle) => contains(rule.name(), needle),
            RuleFilter::Action(action) => rule.action() == *action,
            RuleFilter::Sources(needle) => rule
                .sources()
                .iter()
                .any(|s| contains(&s.name, needle) || contains(&s.email, needle)),
            RuleFilter::Destinations(needle) => rule
                .destinations()
                .iter()
                .any(|d| contains(&d.name, needle) || contains(&d.address, needle)),
        }
    }
}

/// The attribute rules are sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortKey {
    /// Sort by priority key (evaluation order).
    #[default]
    Priority,
    /// Sort by rule name.
    Name,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

/// Offset/limit pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Number of leading results to skip.
    pub offset: u64,
    /// Maximum number of results to return.
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { offset: 0, limit: 50 }
    }
}

/// A rule listing request: optional filter, sort directive, and page window.
///
/// # Examples
///
/// ```
/// use palisade_persistence::types::{RuleFilter, RuleQuery, SortKey, SortOrder};
///
/// let query = RuleQuery::new()
///     .with_filter(RuleFilter::Name("office".into()))
///     .with_sort(SortKey::Priority, SortOrder::Desc)
///     .with_page(0, 20);
/// assert_eq!(query.pagination.limit, 20);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleQuery {
    /// Optional attribute filter.
    pub filter: Option<RuleFilter>,
    /// Attribute to sort by.
    pub sort_key: SortKey,
    /// Sort direction.
    pub sort_order: SortOrder,
    /// Page window.
    pub pagination: Pagination,
}

impl RuleQuery {
    /// Creates a query with defaults: no filter, priority ascending, first 50.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter.
    pub fn with_filter(mut self, filter: RuleFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Sets the sort directive.
    pub fn with_sort(mut self, key: SortKey, order: SortOrder) -> Self {
        self.sort_key = key;
        self.sort_order = order;
        self
    }

    /// Sets the page window.
    pub fn with_page(mut self, offset: u64, limit: u64) -> Self {
        self.pagination = Pagination { offset, limit };
        self
    }

    /// Sorts rules in place per the query's sort directive.
    pub fn sort(&self, rules: &mut [Rule]) {
        match self.sort_key {
            SortKey::Priority => rules.sort_by(|a, b| a.priority().cmp(&b.priority())),
            SortKey::Name => rules.sort_by(|a, b| a.name().cmp(b.name())),
        }
        if self.sort_order == SortOrder::Desc {
            rules.reverse();
        }
    }
}

/// One page of listing results plus the total match count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulePage {
    /// The rules in this page, in the query's sort order.
    pub rules: Vec<Rule>,
    /// Total number of rules matching the filter, across all pages.
    pub total: u64,
}

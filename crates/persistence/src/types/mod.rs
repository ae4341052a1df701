//! Core types for stored rules and queries.

mod query;
mod rule;

pub use query::{Pagination, RuleFilter, RulePage, RuleQuery, SortKey, SortOrder};
pub use rule::{Destination, NewRule, Rule, RuleAction, RuleDraft, RulePatch, Source};

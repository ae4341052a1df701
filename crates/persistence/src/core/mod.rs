//! Storage traits and abstractions.

mod store;

pub use store::RuleStore;

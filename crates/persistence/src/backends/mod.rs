//! Backend implementations of [`RuleStore`](crate::core::RuleStore).

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

//! Palisade Rule Persistence Layer
//!
//! This crate stores tenant-scoped firewall rules and exposes the
//! [`RuleOrderingService`](service::RuleOrderingService), the entry point for
//! creating, reordering, editing, listing, and deleting rules while keeping
//! the tenant's priority order dense, unique, and any-source-last.
//!
//! # Architecture
//!
//! - [`tenant`] - Tenant scoping; every operation is tenant-aware
//! - [`types`] - The rule model and query/pagination types
//! - [`error`] - Error types for all operations
//! - [`core`] - The [`RuleStore`](core::RuleStore) trait boundary
//! - [`backends`] - Backend implementations (in-memory, SQLite)
//! - [`service`] - The ordering service orchestrating the engine and a store
//!
//! The ordering algorithms themselves (key space, conflict resolution) live
//! in the `palisade-ordering` crate; this crate owns the per-tenant critical
//! section and the atomic application of placements.
//!
//! # Quick Start
//!
//! ```no_run
//! use palisade_persistence::backends::sqlite::SqliteBackend;
//! use palisade_persistence::service::RuleOrderingService;
//! use palisade_persistence::tenant::TenantId;
//! use palisade_persistence::types::{Destination, RuleAction, RuleDraft};
//!
//! # async fn example() -> Result<(), palisade_persistence::error::StoreError> {
//! let backend = SqliteBackend::in_memory()?;
//! let service = RuleOrderingService::new(backend);
//! let tenant = TenantId::new("acme");
//!
//! // An empty source list means the rule matches any source; the service
//! // places it after every other rule of the tenant.
//! let created = service
//!     .create(&tenant, RuleDraft {
//!         name: "default deny".into(),
//!         action: RuleAction::Block,
//!         sources: vec![],
//!         destinations: vec![Destination { name: "all".into(), address: "*".into() }],
//!         priority: None,
//!     })
//!     .await?;
//! assert!(created.rule.is_any_source());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod core;
pub mod error;
pub mod service;
pub mod tenant;
pub mod types;

// Re-export commonly used types at crate root
pub use crate::core::RuleStore;
pub use error::{BackendError, StoreError, StoreResult};
pub use service::{CreatedRule, RuleOrderingService};
pub use tenant::TenantId;
pub use types::{Rule, RuleAction, RuleDraft, RulePatch, RuleQuery};

// Re-export the ordering engine's public surface
pub use palisade_ordering::{
    Candidate, ConflictResolver, KeyBump, KeyedRule, OrderingError, Placement, PriorityKey,
    PriorityKeySpace, RuleId, TenantKeySet,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

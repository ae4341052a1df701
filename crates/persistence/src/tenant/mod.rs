//! Multi-tenant scoping.
//!
//! Every rule belongs to exactly one tenant, and every ordering invariant is
//! enforced within one tenant at a time. All storage and service operations
//! take a [`TenantId`]; there is no tenant-free entry point.

mod id;

pub use id::TenantId;

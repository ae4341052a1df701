//! SQLite rule store.
//!
//! Rules are stored in a single `rules` table keyed by `(tenant_id, id)`;
//! priority keys are persisted as exact decimal text, sources and destinations
//! as JSON text columns.

mod backend;
mod schema;
mod store;

pub use backend::{SqliteBackend, SqliteBackendConfig};

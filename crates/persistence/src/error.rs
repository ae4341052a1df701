//! Error types for the rule store.
//!
//! [`StoreError`] is the top-level error for all storage and service
//! operations: ordering failures from the engine, missing rules, and
//! backend-specific failures.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use palisade_ordering::error::OrderingError;
use palisade_ordering::key::RuleId;
use thiserror::Error;

use crate::tenant::TenantId;

/// The primary error type for all store and service operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Ordering engine errors (priority conflicts, precision exhaustion).
    #[error(transparent)]
    Ordering(#[from] OrderingError),

    /// The target rule does not exist in the tenant scope.
    #[error("rule not found: {tenant_id}/{id}")]
    NotFound { tenant_id: TenantId, id: RuleId },

    /// Backend-specific errors.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl StoreError {
    /// Builds a `NotFound` error for the given rule.
    pub fn not_found(tenant_id: &TenantId, id: RuleId) -> Self {
        StoreError::NotFound { tenant_id: tenant_id.clone(), id }
    }
}

/// Errors originating from a storage backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// Connection pool exhausted.
    #[error("connection pool exhausted for {backend_name}")]
    PoolExhausted { backend_name: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Backend(BackendError::SerializationError {
            message: err.to_string(),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Backend(BackendError::Internal {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<r2d2::Error> for StoreError {
    fn from(_err: r2d2::Error) -> Self {
        StoreError::Backend(BackendError::PoolExhausted {
            backend_name: "sqlite".to_string(),
        })
    }
}

use thiserror::Error;

use crate::cache::CacheError;

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    /// The fetch lock for a cache key could not be obtained.
    #[error("Lock acquisition failed: {0}")]
    LockFailed(CacheError),
}

impl RepositoryError {
    /// Shorthand for a missing customer.
    pub fn customer_not_found(id: impl ToString) -> Self {
        RepositoryError::NotFound {
            entity_type: "Customer",
            id: id.to_string(),
        }
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

//! Domain-level error types.

use thiserror::Error;
use uuid::Uuid;

use crate::ports::AuthError;

/// Domain errors - business logic failures.
///
/// Every variant is a terminal, user-visible outcome. Nothing here is retried.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{entity_type} {id} does not exist")]
    NotFound { entity_type: &'static str, id: Uuid },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Could not validate credentials")]
    Unauthenticated,

    /// Login failure. Unknown email and wrong password are deliberately the same.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn post_not_found(id: Uuid) -> Self {
        Self::NotFound {
            entity_type: "Post",
            id,
        }
    }
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    /// Unique or primary-key violation.
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Foreign-key violation: the referenced row is gone.
    #[error("Missing referenced entity: {0}")]
    MissingReference(String),
}

impl From<RepoError> for DomainError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Constraint(msg) => DomainError::Conflict(msg),
            other => DomainError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for DomainError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => DomainError::InvalidCredentials,
            AuthError::InvalidToken(_) | AuthError::MissingSubject | AuthError::MissingAuth => {
                DomainError::Unauthenticated
            }
            AuthError::HashingError(msg) => DomainError::Internal(msg),
        }
    }
}

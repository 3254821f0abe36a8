//! Access-control gate: bearer token to current user.

use std::sync::Arc;

use crate::domain::User;
use crate::error::DomainError;
use crate::ports::{TokenService, UserRepository};

/// Resolves the caller behind a bearer token.
///
/// The user returned here is the only source of "current user" for protected
/// operations.
#[derive(Clone)]
pub struct AccessGate {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenService>,
}

impl AccessGate {
    pub fn new(users: Arc<dyn UserRepository>, tokens: Arc<dyn TokenService>) -> Self {
        Self { users, tokens }
    }

    /// Every failure collapses to `Unauthenticated`; the cause is only logged.
    pub async fn authenticate(&self, token: &str) -> Result<User, DomainError> {
        let claims = self.tokens.verify(token).map_err(|e| {
            tracing::debug!(reason = %e, "Rejected bearer token");
            DomainError::Unauthenticated
        })?;

        match self.users.find_by_id(claims.subject).await? {
            Some(user) => Ok(user),
            None => {
                tracing::debug!(subject = %claims.subject, "Token subject no longer exists");
                Err(DomainError::Unauthenticated)
            }
        }
    }
}

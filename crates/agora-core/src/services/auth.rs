//! Registration and credential login.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::User;
use crate::error::{DomainError, RepoError};
use crate::ports::{PasswordService, TokenService, UserRepository};

/// A successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub user_id: Uuid,
    pub expires_in: i64,
}

/// Authentication flow: credential store + hasher + token issuer.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordService>,
    tokens: Arc<dyn TokenService>,
    /// Verified against when the email is unknown, so both login failures
    /// cost one password verification.
    decoy_hash: Option<String>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: Arc<dyn PasswordService>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        let decoy_hash = passwords
            .hash("agora-decoy-password")
            .inspect_err(|e| tracing::warn!(error = %e, "Could not prepare decoy password hash"))
            .ok();

        Self {
            users,
            passwords,
            tokens,
            decoy_hash,
        }
    }

    /// Register a new identity. Duplicate emails are a conflict.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, DomainError> {
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::Validation("Invalid email address".to_string()));
        }
        if password.is_empty() {
            return Err(DomainError::Validation(
                "Password must not be empty".to_string(),
            ));
        }

        let password_hash = self.passwords.hash(password)?;
        let user = User::new(email.to_string(), password_hash);

        let user = self.users.insert(user).await.map_err(|e| match e {
            RepoError::Constraint(_) => {
                DomainError::Conflict("Email already registered".to_string())
            }
            other => other.into(),
        })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Exchange credentials for a bearer token.
    ///
    /// An unknown email and a wrong password both yield `InvalidCredentials`.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, DomainError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            if let Some(decoy) = &self.decoy_hash {
                // Result ignored; only the timing matters
                let _ = self.passwords.verify(password, decoy);
            }
            return Err(DomainError::InvalidCredentials);
        };

        if !self.passwords.verify(password, &user.password_hash)? {
            return Err(DomainError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id)?;

        tracing::debug!(user_id = %user.id, "Issued access token");
        Ok(LoginOutcome {
            token,
            user_id: user.id,
            expires_in: self.tokens.ttl_seconds(),
        })
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound {
                entity_type: "User",
                id,
            })
    }
}

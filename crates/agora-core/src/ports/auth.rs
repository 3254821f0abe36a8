//! Authentication ports.

use uuid::Uuid;

/// Claims carried by a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub subject: Uuid,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// Issues and verifies signed, time-bound bearer tokens.
///
/// Implementations are stateless: nothing is recorded server-side, so expiry
/// is the only way a token stops working.
pub trait TokenService: Send + Sync {
    /// Issue a token for `subject`, expiring after the configured TTL.
    fn issue(&self, subject: Uuid) -> Result<String, AuthError>;

    /// Check signature, issuer and expiry, then return the claims.
    fn verify(&self, token: &str) -> Result<TokenClaims, AuthError>;

    /// Configured token lifetime in seconds.
    fn ttl_seconds(&self) -> i64;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a hash in constant time.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token has no subject")]
    MissingSubject,

    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Hashing error: {0}")]
    HashingError(String),
}

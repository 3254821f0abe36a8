//! JWT token service implementation.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use agora_core::ports::{AuthError, TokenClaims, TokenService};

const DEFAULT_SECRET: &str = "change-me-in-production";

/// Upper bound for `JWT_EXPIRATION_MINUTES` (30 days).
pub const MAX_EXPIRATION_MINUTES: i64 = 60 * 24 * 30;

/// Rejected token configuration.
#[derive(Debug, thiserror::Error)]
pub enum JwtConfigError {
    #[error(
        "JWT_EXPIRATION_MINUTES must be an integer between 1 and {max}, got {0:?}",
        max = MAX_EXPIRATION_MINUTES
    )]
    InvalidExpiration(String),
}

/// Parse a token lifetime in minutes, accepting `1..=MAX_EXPIRATION_MINUTES`.
fn parse_expiration_minutes(raw: &str) -> Result<i64, JwtConfigError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|m| (1..=MAX_EXPIRATION_MINUTES).contains(m))
        .ok_or_else(|| JwtConfigError::InvalidExpiration(raw.to_string()))
}

/// JWT token service configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_minutes: i64,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            expiration_minutes: 30,
            issuer: "agora-api".to_string(),
        }
    }
}

impl JwtConfig {
    /// Load from `JWT_SECRET`, `JWT_EXPIRATION_MINUTES` and `JWT_ISSUER`.
    pub fn from_env() -> Result<Self, JwtConfigError> {
        let defaults = Self::default();
        let secret = std::env::var("JWT_SECRET").unwrap_or(defaults.secret);

        // Warn if using default secret in production
        if secret == DEFAULT_SECRET {
            let is_production = std::env::var("RUST_ENV")
                .map(|v| v == "production" || v == "prod")
                .unwrap_or(false);

            if is_production {
                tracing::error!(
                    "SECURITY: Using default JWT secret in production! Set JWT_SECRET environment variable."
                );
            } else {
                tracing::warn!("Using default JWT secret. Set JWT_SECRET for production use.");
            }
        }

        let expiration_minutes = match std::env::var("JWT_EXPIRATION_MINUTES") {
            Ok(raw) => parse_expiration_minutes(&raw)?,
            Err(_) => defaults.expiration_minutes,
        };

        Ok(Self {
            secret,
            expiration_minutes,
            issuer: std::env::var("JWT_ISSUER").unwrap_or(defaults.issuer),
        })
    }
}

/// Wire claims. `sub` is optional here so a signed token without a subject
/// is reported as such instead of as a decoding failure.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<String>,
    exp: i64,
    iat: i64,
    iss: String,
}

/// HS256 JWT token service.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.leeway = 0;

        Self {
            encoding_key,
            decoding_key,
            validation,
            config,
        }
    }

    pub fn from_env() -> Result<Self, JwtConfigError> {
        Ok(Self::new(JwtConfig::from_env()?))
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, subject: Uuid) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = TimeDelta::try_minutes(self.config.expiration_minutes)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                AuthError::InvalidToken("token lifetime out of range".to_string())
            })?;

        let claims = Claims {
            sub: Some(subject.to_string()),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let sub = token_data
            .claims
            .sub
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::MissingSubject)?;
        let subject = Uuid::parse_str(&sub).map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(TokenClaims {
            subject,
            issued_at: token_data.claims.iat,
            expires_at: token_data.claims.exp,
        })
    }

    fn ttl_seconds(&self) -> i64 {
        self.config.expiration_minutes * 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key".to_string(),
            expiration_minutes: 30,
            issuer: "test-issuer".to_string(),
        }
    }

    #[test]
    fn test_issue_and_verify_round_trip_subject() {
        let service = JwtTokenService::new(test_config());
        let user_id = Uuid::new_v4();

        let token = service.issue(user_id).unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.subject, user_id);
        assert_eq!(claims.expires_at - claims.issued_at, 30 * 60);
    }

    #[test]
    fn test_verify_garbage_token() {
        let service = JwtTokenService::new(test_config());

        let result = service.verify("invalid-token");

        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let expired = JwtTokenService::new(JwtConfig {
            expiration_minutes: -5,
            ..test_config()
        });
        let token = expired.issue(Uuid::new_v4()).unwrap();

        // Same secret and issuer: the signature is valid, only `exp` is past.
        let service = JwtTokenService::new(test_config());
        assert!(matches!(
            service.verify(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_verify_rejects_foreign_signature() {
        let other = JwtTokenService::new(JwtConfig {
            secret: "another-secret".to_string(),
            ..test_config()
        });
        let token = other.issue(Uuid::new_v4()).unwrap();

        let service = JwtTokenService::new(test_config());
        assert!(matches!(
            service.verify(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_verify_rejects_tampered_payload() {
        let service = JwtTokenService::new(test_config());
        let token = service.issue(Uuid::new_v4()).unwrap();
        let forged = service.issue(Uuid::new_v4()).unwrap();

        // Header and payload of one token with the signature of another.
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_sig = forged.rsplit('.').next().unwrap();
        parts[2] = forged_sig;

        assert!(service.verify(&parts.join(".")).is_err());
    }

    #[test]
    fn test_verify_wrong_issuer_token() {
        let service1 = JwtTokenService::new(JwtConfig {
            issuer: "issuer1".to_string(),
            ..test_config()
        });
        let service2 = JwtTokenService::new(JwtConfig {
            issuer: "issuer2".to_string(),
            ..test_config()
        });

        let token = service1.issue(Uuid::new_v4()).unwrap();

        assert!(service2.verify(&token).is_err());
    }

    #[test]
    fn test_verify_token_without_subject() {
        let config = test_config();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: None,
            exp: now + 600,
            iat: now,
            iss: config.issuer.clone(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        let service = JwtTokenService::new(config);
        assert!(matches!(
            service.verify(&token),
            Err(AuthError::MissingSubject)
        ));
    }

    #[test]
    fn test_ttl_seconds() {
        let service = JwtTokenService::new(JwtConfig {
            expiration_minutes: 30,
            ..test_config()
        });

        assert_eq!(service.ttl_seconds(), 1800);
    }

    #[test]
    fn test_expiration_minutes_must_be_positive_and_bounded() {
        assert_eq!(parse_expiration_minutes("30").unwrap(), 30);
        assert_eq!(parse_expiration_minutes(" 60 ").unwrap(), 60);
        assert_eq!(
            parse_expiration_minutes(&MAX_EXPIRATION_MINUTES.to_string()).unwrap(),
            MAX_EXPIRATION_MINUTES
        );

        for raw in ["0", "-5", "43201", "9223372036854775807", "thirty", ""] {
            assert!(
                matches!(
                    parse_expiration_minutes(raw),
                    Err(JwtConfigError::InvalidExpiration(_))
                ),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_issue_with_out_of_range_lifetime_fails_without_panicking() {
        let service = JwtTokenService::new(JwtConfig {
            expiration_minutes: i64::MAX,
            ..test_config()
        });

        assert!(matches!(
            service.issue(Uuid::new_v4()),
            Err(AuthError::InvalidToken(_))
        ));
    }
}

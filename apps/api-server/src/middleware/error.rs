//! Error handling middleware - RFC 7807 compliant responses.

use actix_web::{HttpResponse, ResponseError, http::StatusCode, http::header};
use agora_core::error::DomainError;
use agora_shared::ErrorResponse;
use std::fmt;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    /// Missing, malformed or rejected bearer token.
    Unauthorized,
    /// Login with an unknown email or a wrong password.
    InvalidCredentials,
    Forbidden(String),
    Conflict(String),
    TooManyRequests { retry_after_secs: u64 },
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Unauthorized => write!(f, "Unauthorized"),
            AppError::InvalidCredentials => write!(f, "Invalid Credentials"),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::TooManyRequests { retry_after_secs } => {
                write!(f, "Too many requests, retry after {}s", retry_after_secs)
            }
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::InvalidCredentials | AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());

        let error = match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::Unauthorized => {
                builder.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
                ErrorResponse::unauthorized()
            }
            AppError::InvalidCredentials => ErrorResponse::forbidden("Invalid Credentials"),
            AppError::Forbidden(detail) => ErrorResponse::forbidden(detail),
            AppError::Conflict(detail) => ErrorResponse::conflict(detail),
            AppError::TooManyRequests { retry_after_secs } => {
                builder
                    .insert_header((header::RETRY_AFTER, retry_after_secs.to_string()))
                    .insert_header(("X-RateLimit-Remaining", "0"));
                ErrorResponse::too_many_requests(*retry_after_secs)
            }
            AppError::Internal(detail) => {
                // Log internal errors
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
        };

        builder.json(error)
    }
}

// Conversion from domain errors
impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { .. } => AppError::NotFound(err.to_string()),
            DomainError::Validation(msg) => AppError::BadRequest(msg),
            DomainError::Conflict(msg) => AppError::Conflict(msg),
            DomainError::Unauthenticated => AppError::Unauthorized,
            DomainError::InvalidCredentials => AppError::InvalidCredentials,
            DomainError::Forbidden(msg) => AppError::Forbidden(msg),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_domain_errors_map_to_status_codes() {
        let cases = [
            (DomainError::post_not_found(Uuid::new_v4()), StatusCode::NOT_FOUND),
            (DomainError::Validation("dir".into()), StatusCode::BAD_REQUEST),
            (DomainError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (DomainError::InvalidCredentials, StatusCode::FORBIDDEN),
            (DomainError::Forbidden("nope".into()), StatusCode::FORBIDDEN),
            (DomainError::Conflict("again".into()), StatusCode::CONFLICT),
            (DomainError::Internal("db".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_unauthorized_carries_bearer_challenge() {
        let res = AppError::Unauthorized.error_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            res.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    #[test]
    fn test_too_many_requests_sets_retry_after() {
        let res = AppError::TooManyRequests {
            retry_after_secs: 7,
        }
        .error_response();
        assert_eq!(res.headers().get(header::RETRY_AFTER).unwrap(), "7");
    }
}

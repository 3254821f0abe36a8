//! Authentication extractor.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use std::future::Future;
use std::pin::Pin;

use agora_core::domain::User;

use crate::middleware::error::AppError;
use crate::state::AppState;

/// The authenticated caller, resolved from the `Authorization: Bearer` header.
///
/// Use this in handlers to require authentication:
/// ```ignore
/// async fn protected_route(user: CurrentUser) -> impl Responder {
///     format!("Hello, user {}!", user.id())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn id(&self) -> uuid::Uuid {
        self.0.id
    }
}

/// Pull the token out of `Bearer <token>`. The scheme is case-insensitive.
fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token.to_string())
    } else {
        None
    }
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let Some(state) = state else {
                tracing::error!("AppState not found in app data");
                return Err(AppError::Internal("Server configuration error".to_string()));
            };

            let Some(token) = token else {
                tracing::debug!("Request without a bearer token");
                return Err(AppError::Unauthorized);
            };

            let user = state.gate.authenticate(&token).await?;
            Ok(CurrentUser(user))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_bearer_token_parsing() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc.def.ghi"))
            .to_http_request();
        assert_eq!(bearer_token(&req).as_deref(), Some("abc.def.ghi"));

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "bearer abc"))
            .to_http_request();
        assert_eq!(bearer_token(&req).as_deref(), Some("abc"));
    }

    #[test]
    fn test_bearer_token_rejects_other_schemes() {
        for value in ["Basic dXNlcjpwYXNz", "Bearer", "Bearer   ", "abc"] {
            let req = TestRequest::default()
                .insert_header((header::AUTHORIZATION, value))
                .to_http_request();
            assert_eq!(bearer_token(&req), None, "{value}");
        }

        assert_eq!(bearer_token(&TestRequest::default().to_http_request()), None);
    }
}

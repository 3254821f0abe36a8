//! Login throttling middleware.

use actix_web::{
    Error, ResponseError,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    web,
};
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Rate limiting middleware factory.
///
/// Uses the limiter configured on [`AppState`], keyed by the peer IP. Requests
/// pass through untouched when no limiter is configured.
pub struct RateLimitMiddleware;

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

fn client_key(req: &ServiceRequest) -> String {
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let limiter = req
            .app_data::<web::Data<AppState>>()
            .and_then(|state| state.login_limiter.clone());

        // Socket peer only; forwarding headers are client-controlled
        let key = client_key(&req);

        Box::pin(async move {
            if let Some(limiter) = limiter {
                match limiter.check(&key).await {
                    Ok(result) if !result.allowed => {
                        tracing::warn!("Rate limit exceeded for key: {}", key);

                        let response = AppError::TooManyRequests {
                            retry_after_secs: result.reset_after.as_secs().max(1),
                        }
                        .error_response();

                        let (http_req, _payload) = req.into_parts();
                        return Ok(ServiceResponse::new(http_req, response).map_into_right_body());
                    }
                    Ok(_) => {}
                    // Fail open
                    Err(e) => tracing::error!("Rate limiter error, failing open: {}", e),
                }
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

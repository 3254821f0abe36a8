//! Credential login.

use actix_web::{HttpResponse, web};

use agora_shared::dto::{AuthResponse, LoginRequest};

use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let outcome = state.auth.login(&req.email, &req.password).await?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token: outcome.token,
        token_type: "bearer".to_string(),
        id: outcome.user_id,
        expires_in: outcome.expires_in.max(0) as u64,
    }))
}

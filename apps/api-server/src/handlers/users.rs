//! User registration and lookup.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use agora_shared::dto::RegisterUserRequest;

use super::user_response;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/users
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let user = state.auth.register(&req.email, &req.password).await?;

    Ok(HttpResponse::Created().json(user_response(&user)))
}

/// GET /api/users/{id}
pub async fn get_user(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let user = state.auth.get_user(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(user_response(&user)))
}

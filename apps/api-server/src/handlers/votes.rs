//! Voting endpoint.

use actix_web::{HttpResponse, web};

use agora_core::domain::VoteDirection;
use agora_shared::dto::{MessageResponse, VoteRequest};

use crate::middleware::auth::CurrentUser;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/vote
pub async fn vote(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<VoteRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let direction = VoteDirection::try_from(req.dir)?;

    let outcome = state.votes.vote(user.id(), req.post_id, direction).await?;

    Ok(HttpResponse::Created().json(MessageResponse {
        message: outcome.message().to_string(),
    }))
}

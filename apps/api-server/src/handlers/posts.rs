//! Post endpoints. All of them require a bearer token.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use agora_core::domain::{PostDraft, PostQuery};
use agora_shared::dto::{ListPostsQuery, PostRequest};

use super::{post_response, post_with_votes_response};
use crate::middleware::auth::CurrentUser;
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn draft(req: PostRequest) -> PostDraft {
    PostDraft {
        title: req.title,
        content: req.content,
        published: req.published,
    }
}

/// GET /api/posts?limit&skip&search
pub async fn list_posts(
    state: web::Data<AppState>,
    _user: CurrentUser,
    query: web::Query<ListPostsQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let defaults = PostQuery::default();

    let posts = state
        .posts
        .list(PostQuery {
            limit: query.limit.unwrap_or(defaults.limit),
            offset: query.skip.unwrap_or(defaults.offset),
            search: query.search.unwrap_or(defaults.search),
        })
        .await?;

    let body: Vec<_> = posts.into_iter().map(post_with_votes_response).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /api/posts/{id}
pub async fn get_post(
    state: web::Data<AppState>,
    _user: CurrentUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state.posts.get(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(post_with_votes_response(post)))
}

/// POST /api/posts
pub async fn create_post(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    let post = state.posts.create(user.id(), draft(body.into_inner())).await?;

    Ok(HttpResponse::Created().json(post_response(post, user.0.as_owner())))
}

/// PUT /api/posts/{id}
pub async fn update_post(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .update(path.into_inner(), user.id(), draft(body.into_inner()))
        .await?;

    // Only the owner gets this far
    Ok(HttpResponse::Ok().json(post_response(post, user.0.as_owner())))
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state.posts.delete(path.into_inner(), user.id()).await?;

    Ok(HttpResponse::NoContent().finish())
}

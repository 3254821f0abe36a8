//! HTTP handlers and route configuration.

mod auth;
mod health;
mod posts;
mod users;
mod votes;

#[cfg(test)]
mod tests;

use actix_web::{HttpRequest, error, web};
use agora_core::domain::{Owner, Post, PostWithVotes, User};
use agora_shared::dto::{PostResponse, PostWithVotesResponse, UserResponse};

use crate::middleware::error::AppError;
use crate::middleware::rate_limit::RateLimitMiddleware;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::PathConfig::default().error_handler(path_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .service(
            web::scope("/api")
                // Public routes
                .route("/health", web::get().to(health::health_check))
                .route("/users", web::post().to(users::register))
                .route("/users/{id}", web::get().to(users::get_user))
                .service(
                    web::resource("/login")
                        .wrap(RateLimitMiddleware)
                        .route(web::post().to(auth::login)),
                )
                // Authenticated routes
                .route("/posts", web::get().to(posts::list_posts))
                .route("/posts", web::post().to(posts::create_post))
                .route("/posts/{id}", web::get().to(posts::get_post))
                .route("/posts/{id}", web::put().to(posts::update_post))
                .route("/posts/{id}", web::delete().to(posts::delete_post))
                .route("/vote", web::post().to(votes::vote)),
        );
}

fn json_error(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

fn path_error(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

fn query_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

fn user_response(user: &User) -> UserResponse {
    UserResponse {
        id: user.id,
        email: user.email.clone(),
        created_at: user.created_at,
    }
}

fn post_response(post: Post, owner: Owner) -> PostResponse {
    PostResponse {
        id: post.id,
        title: post.title,
        content: post.content,
        published: post.published,
        created_at: post.created_at,
        owner_id: post.owner_id,
        owner: UserResponse {
            id: owner.id,
            email: owner.email,
            created_at: owner.created_at,
        },
    }
}

fn post_with_votes_response(item: PostWithVotes) -> PostWithVotesResponse {
    PostWithVotesResponse {
        post: post_response(item.post, item.owner),
        votes: item.votes,
    }
}

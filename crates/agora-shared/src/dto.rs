//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub email: String,
    pub password: String,
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response containing a user's public information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Response containing an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    /// The authenticated user's id.
    pub id: Uuid,
    pub expires_in: u64,
}

fn default_published() -> bool {
    true
}

/// Body of create and update post requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRequest {
    pub title: String,
    pub content: String,
    #[serde(default = "default_published")]
    pub published: bool,
}

/// A post as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub owner_id: Uuid,
    pub owner: UserResponse,
}

/// A post together with its current vote count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostWithVotesResponse {
    pub post: PostResponse,
    pub votes: u64,
}

/// Query string of `GET /posts`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPostsQuery {
    pub limit: Option<u64>,
    pub skip: Option<u64>,
    pub search: Option<String>,
}

/// Vote request. `dir` is 1 to add a vote and 0 to remove it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRequest {
    pub post_id: Uuid,
    pub dir: i32,
}

/// Plain acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

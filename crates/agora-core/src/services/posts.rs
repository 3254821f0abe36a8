//! Post use cases with ownership enforcement.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Post, PostDraft, PostQuery, PostWithVotes};
use crate::error::{DomainError, RepoError};
use crate::ports::{Guarded, PostRepository};

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>) -> Self {
        Self { posts }
    }

    /// Create a post. `owner_id` must come from the access gate.
    pub async fn create(&self, owner_id: Uuid, draft: PostDraft) -> Result<Post, DomainError> {
        draft.validate()?;

        let post = self
            .posts
            .insert(Post::new(owner_id, draft))
            .await
            .map_err(|e| match e {
                RepoError::MissingReference(_) => DomainError::Unauthenticated,
                other => other.into(),
            })?;

        tracing::info!(post_id = %post.id, owner_id = %owner_id, "Post created");
        Ok(post)
    }

    pub async fn get(&self, id: Uuid) -> Result<PostWithVotes, DomainError> {
        self.posts
            .find_with_votes(id)
            .await?
            .ok_or(DomainError::post_not_found(id))
    }

    pub async fn list(&self, query: PostQuery) -> Result<Vec<PostWithVotes>, DomainError> {
        let query = query.normalized();
        Ok(self.posts.list_with_votes(&query).await?)
    }

    pub async fn update(
        &self,
        id: Uuid,
        caller: Uuid,
        draft: PostDraft,
    ) -> Result<Post, DomainError> {
        draft.validate()?;

        match self.posts.update_owned(id, caller, draft).await? {
            Guarded::Applied(post) => {
                tracing::info!(post_id = %id, "Post updated");
                Ok(post)
            }
            Guarded::Missing => Err(DomainError::post_not_found(id)),
            Guarded::NotOwner => {
                tracing::warn!(post_id = %id, caller = %caller, "Rejected update by non-owner");
                Err(DomainError::Forbidden(
                    "Not authorized to update this post".to_string(),
                ))
            }
        }
    }

    pub async fn delete(&self, id: Uuid, caller: Uuid) -> Result<(), DomainError> {
        match self.posts.delete_owned(id, caller).await? {
            Guarded::Applied(()) => {
                tracing::info!(post_id = %id, "Post deleted");
                Ok(())
            }
            Guarded::Missing => Err(DomainError::post_not_found(id)),
            Guarded::NotOwner => {
                tracing::warn!(post_id = %id, caller = %caller, "Rejected delete by non-owner");
                Err(DomainError::Forbidden(
                    "Not authorized to delete this post".to_string(),
                ))
            }
        }
    }
}

//! Vote ledger: at most one upvote per (user, post).

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Vote, VoteDirection, VoteOutcome};
use crate::error::{DomainError, RepoError};
use crate::ports::{PostRepository, VoteRepository};

#[derive(Clone)]
pub struct VoteService {
    posts: Arc<dyn PostRepository>,
    votes: Arc<dyn VoteRepository>,
}

impl VoteService {
    pub fn new(posts: Arc<dyn PostRepository>, votes: Arc<dyn VoteRepository>) -> Self {
        Self { posts, votes }
    }

    /// Add or remove `caller`'s vote on `post_id`.
    ///
    /// The existence check gives a precise error in the common case; the
    /// store's uniqueness on the pair decides concurrent upvotes.
    pub async fn vote(
        &self,
        caller: Uuid,
        post_id: Uuid,
        direction: VoteDirection,
    ) -> Result<VoteOutcome, DomainError> {
        if self.posts.find_by_id(post_id).await?.is_none() {
            return Err(DomainError::post_not_found(post_id));
        }

        let existing = self.votes.find(caller, post_id).await?;

        match direction {
            VoteDirection::Upvote => {
                if existing.is_some() {
                    return Err(already_voted(caller, post_id));
                }
                self.votes
                    .insert(Vote::new(caller, post_id))
                    .await
                    .map_err(|e| match e {
                        RepoError::Constraint(_) => already_voted(caller, post_id),
                        RepoError::MissingReference(_) => DomainError::post_not_found(post_id),
                        other => other.into(),
                    })?;

                tracing::debug!(post_id = %post_id, user_id = %caller, "Vote added");
                Ok(VoteOutcome::Added)
            }
            VoteDirection::RemoveVote => {
                if existing.is_none() {
                    return Err(vote_not_found(post_id));
                }
                self.votes
                    .delete(caller, post_id)
                    .await
                    .map_err(|e| match e {
                        RepoError::NotFound => vote_not_found(post_id),
                        other => other.into(),
                    })?;

                tracing::debug!(post_id = %post_id, user_id = %caller, "Vote removed");
                Ok(VoteOutcome::Removed)
            }
        }
    }
}

fn already_voted(user_id: Uuid, post_id: Uuid) -> DomainError {
    DomainError::Conflict(format!(
        "User {user_id} has already voted on post {post_id}"
    ))
}

fn vote_not_found(post_id: Uuid) -> DomainError {
    DomainError::NotFound {
        entity_type: "Vote on post",
        id: post_id,
    }
}

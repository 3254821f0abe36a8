use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Post, PostDraft, PostQuery, PostWithVotes, User, Vote};
use crate::error::RepoError;

/// Generic repository trait shared by the entity stores.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity. Unique violations surface as `RepoError::Constraint`.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;
}

/// Outcome of a mutation that is only allowed for the owner of a row.
///
/// The lookup, the ownership comparison and the write happen inside one
/// transaction, so nothing is mutated unless the outcome is `Applied`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guarded<T> {
    Applied(T),
    Missing,
    NotOwner,
}

/// User (credential) repository.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
}

/// Post repository. Vote counts are always aggregated on read.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Fetch one post with its owner and vote count.
    async fn find_with_votes(&self, id: Uuid) -> Result<Option<PostWithVotes>, RepoError>;

    /// Filtered, stably ordered page of posts with owners and vote counts.
    async fn list_with_votes(&self, query: &PostQuery) -> Result<Vec<PostWithVotes>, RepoError>;

    /// Replace the editable fields if `caller` owns the post.
    async fn update_owned(
        &self,
        id: Uuid,
        caller: Uuid,
        draft: PostDraft,
    ) -> Result<Guarded<Post>, RepoError>;

    /// Delete the post and all its votes if `caller` owns it.
    async fn delete_owned(&self, id: Uuid, caller: Uuid) -> Result<Guarded<()>, RepoError>;
}

/// Vote ledger storage. The (user, post) pair is unique at the store level.
#[async_trait]
pub trait VoteRepository: Send + Sync {
    async fn find(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<Vote>, RepoError>;

    /// Insert a vote. A duplicate pair is `RepoError::Constraint`, a vanished
    /// post or user is `RepoError::MissingReference`.
    async fn insert(&self, vote: Vote) -> Result<(), RepoError>;

    /// Delete a vote. `RepoError::NotFound` if the pair has no vote.
    async fn delete(&self, user_id: Uuid, post_id: Uuid) -> Result<(), RepoError>;
}

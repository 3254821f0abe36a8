//! In-memory store - used when no database is configured, and as the
//! substitute store in tests.
//!
//! All three relations live behind one async `RwLock`. Every mutation runs
//! inside a single write-lock critical section, which gives it the same
//! all-or-nothing behaviour as a database transaction, including the
//! cascades and constraint checks a relational schema would enforce.
//! Data is lost on process restart.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use agora_core::domain::{Post, PostDraft, PostQuery, PostWithVotes, User, Vote};
use agora_core::error::RepoError;
use agora_core::ports::{BaseRepository, Guarded, PostRepository, UserRepository, VoteRepository};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    posts: HashMap<Uuid, Post>,
    /// (user_id, post_id)
    votes: HashSet<(Uuid, Uuid)>,
}

impl Tables {
    fn vote_count(&self, post_id: Uuid) -> u64 {
        self.votes.iter().filter(|(_, p)| *p == post_id).count() as u64
    }

    fn with_votes(&self, post: &Post) -> Option<PostWithVotes> {
        // owner_id always references an existing user; a miss means corruption
        let owner = self.users.get(&post.owner_id)?;
        Some(PostWithVotes {
            post: post.clone(),
            owner: owner.as_owner(),
            votes: self.vote_count(post.id),
        })
    }

    fn owned_post_mut(&mut self, id: Uuid, caller: Uuid) -> Guarded<&mut Post> {
        match self.posts.get_mut(&id) {
            None => Guarded::Missing,
            Some(post) if !post.is_owned_by(caller) => Guarded::NotOwner,
            Some(post) => Guarded::Applied(post),
        }
    }
}

/// In-memory implementation of every repository port.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;

        if tables.users.contains_key(&user.id) {
            return Err(RepoError::Constraint("users_pkey".to_string()));
        }
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(RepoError::Constraint("users_email_key".to_string()));
        }

        tables.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&post.owner_id) {
            return Err(RepoError::MissingReference("posts_owner_id_fkey".to_string()));
        }
        if tables.posts.contains_key(&post.id) {
            return Err(RepoError::Constraint("posts_pkey".to_string()));
        }

        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn find_with_votes(&self, id: Uuid) -> Result<Option<PostWithVotes>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.get(&id).and_then(|p| tables.with_votes(p)))
    }

    async fn list_with_votes(&self, query: &PostQuery) -> Result<Vec<PostWithVotes>, RepoError> {
        let tables = self.tables.read().await;

        let mut posts: Vec<&Post> = tables.posts.values().filter(|p| query.matches(p)).collect();
        posts.sort_by_key(|p| (p.created_at, p.id));

        Ok(posts
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .filter_map(|p| tables.with_votes(p))
            .collect())
    }

    async fn update_owned(
        &self,
        id: Uuid,
        caller: Uuid,
        draft: PostDraft,
    ) -> Result<Guarded<Post>, RepoError> {
        let mut tables = self.tables.write().await;

        Ok(match tables.owned_post_mut(id, caller) {
            Guarded::Applied(post) => {
                post.apply(draft);
                Guarded::Applied(post.clone())
            }
            Guarded::Missing => Guarded::Missing,
            Guarded::NotOwner => Guarded::NotOwner,
        })
    }

    async fn delete_owned(&self, id: Uuid, caller: Uuid) -> Result<Guarded<()>, RepoError> {
        let mut tables = self.tables.write().await;

        match tables.owned_post_mut(id, caller) {
            Guarded::Applied(_) => {}
            Guarded::Missing => return Ok(Guarded::Missing),
            Guarded::NotOwner => return Ok(Guarded::NotOwner),
        }

        tables.posts.remove(&id);
        // ON DELETE CASCADE
        tables.votes.retain(|(_, post_id)| *post_id != id);
        Ok(Guarded::Applied(()))
    }
}

#[async_trait]
impl VoteRepository for InMemoryStore {
    async fn find(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<Vote>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .votes
            .contains(&(user_id, post_id))
            .then(|| Vote::new(user_id, post_id)))
    }

    async fn insert(&self, vote: Vote) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&vote.user_id) {
            return Err(RepoError::MissingReference("votes_user_id_fkey".to_string()));
        }
        if !tables.posts.contains_key(&vote.post_id) {
            return Err(RepoError::MissingReference("votes_post_id_fkey".to_string()));
        }
        if !tables.votes.insert((vote.user_id, vote.post_id)) {
            return Err(RepoError::Constraint("votes_pkey".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, user_id: Uuid, post_id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;

        if tables.votes.remove(&(user_id, post_id)) {
            Ok(())
        } else {
            Err(RepoError::NotFound)
        }
    }
}

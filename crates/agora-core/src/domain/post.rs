use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::Owner;
use crate::error::DomainError;

/// Upper bound on the page size a listing may request.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Post entity - owned by the user who created it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post owned by `owner_id`.
    pub fn new(owner_id: Uuid, draft: PostDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            title: draft.title,
            content: draft.content,
            published: draft.published,
            created_at: Utc::now(),
        }
    }

    /// Ownership rule: only the creator may mutate a post.
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    /// Overwrite the editable fields. Identity, owner and timestamp are kept.
    pub fn apply(&mut self, draft: PostDraft) {
        self.title = draft.title;
        self.content = draft.content;
        self.published = draft.published;
    }
}

/// The user-editable fields of a post, used for both create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub published: bool,
}

impl PostDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            published: true,
        }
    }

    pub fn unpublished(mut self) -> Self {
        self.published = false;
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::Validation("title must not be empty".to_string()));
        }
        if self.content.trim().is_empty() {
            return Err(DomainError::Validation(
                "content must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// A post read model: the post, its owner and the live vote count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostWithVotes {
    pub post: Post,
    pub owner: Owner,
    pub votes: u64,
}

/// Listing parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    pub limit: u64,
    pub offset: u64,
    /// Case-sensitive title substring; empty matches every post.
    pub search: String,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            limit: 10,
            offset: 0,
            search: String::new(),
        }
    }
}

impl PostQuery {
    /// Cap the page size at `MAX_PAGE_SIZE`. A limit of 0 yields an empty page.
    pub fn normalized(mut self) -> Self {
        self.limit = self.limit.min(MAX_PAGE_SIZE);
        self
    }

    pub fn matches(&self, post: &Post) -> bool {
        post.title.contains(&self.search)
    }
}

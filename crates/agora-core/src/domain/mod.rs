//! Domain entities - the core business objects.

mod post;
mod user;
mod vote;

pub use post::{MAX_PAGE_SIZE, Post, PostDraft, PostQuery, PostWithVotes};
pub use user::{Owner, User};
pub use vote::{Vote, VoteDirection, VoteOutcome};

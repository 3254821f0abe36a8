//! SeaORM entities for the `users`, `posts` and `votes` relations.

pub mod post;
pub mod user;
pub mod vote;

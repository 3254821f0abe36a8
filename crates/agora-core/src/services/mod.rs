//! Services - the use cases, built over injected ports.
//!
//! Each service holds `Arc<dyn ...>` handles to its ports and no other state,
//! so any store implementing the repository traits can back it.

mod auth;
mod gate;
mod posts;
mod votes;

pub use auth::{AuthService, LoginOutcome};
pub use gate::AccessGate;
pub use posts::PostService;
pub use votes::VoteService;

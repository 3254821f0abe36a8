//! # Agora Core
//!
//! The domain layer of Agora.
//! This crate contains the entities, the ports infrastructure must implement,
//! and the services that enforce authentication, post ownership and the
//! one-vote-per-user rule. It has zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::DomainError;

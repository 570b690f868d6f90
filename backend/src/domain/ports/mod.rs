//! Domain ports defining the edges of the hexagon.
//!
//! Each driven adapter (database, in-memory store, hasher, token signer)
//! implements one of these traits. Errors are strongly typed per port and
//! convert into the domain [`Error`](crate::domain::Error) at the service
//! boundary.

mod macros;

mod credential_hasher;
mod evaluation_repository;
mod follow_repository;
mod idea_repository;
mod token_service;
mod user_repository;

pub(crate) use macros::define_port_error;

#[cfg(test)]
pub use credential_hasher::MockCredentialHasher;
pub use credential_hasher::{CredentialHashError, CredentialHasher};
#[cfg(test)]
pub use evaluation_repository::MockEvaluationRepository;
pub use evaluation_repository::{
    EvaluationPersistenceError, EvaluationRepository, EvaluationScan,
};
#[cfg(test)]
pub use follow_repository::MockFollowRepository;
pub use follow_repository::{FollowPersistenceError, FollowRepository};
#[cfg(test)]
pub use idea_repository::MockIdeaRepository;
pub use idea_repository::{IdeaPersistenceError, IdeaRepository};
#[cfg(test)]
pub use token_service::MockTokenService;
pub use token_service::{TokenError, TokenService};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};

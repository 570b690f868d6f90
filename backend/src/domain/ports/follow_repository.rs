//! Port for the follow graph, stored as directed edge records.
//!
//! An edge `(follower, followee)` means `follower` follows `followee`. Follow
//! and unfollow are single-record writes, so the graph can never be half
//! updated.
use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::{UserId, Username};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by follow graph adapters.
    pub enum FollowPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "follow repository connection failed: {message}"; service_unavailable,
        /// Query or mutation failed during execution.
        Query { message: String } => "follow repository query failed: {message}"; internal,
    }
}

/// Storage of follow edges.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Add an edge. Returns `false` if it already existed.
    async fn insert_edge(
        &self,
        follower: &UserId,
        followee: &UserId,
    ) -> Result<bool, FollowPersistenceError>;

    /// Remove an edge. Returns `false` if there was none.
    async fn delete_edge(
        &self,
        follower: &UserId,
        followee: &UserId,
    ) -> Result<bool, FollowPersistenceError>;

    /// Usernames of the users following `user`, alphabetically.
    async fn followers_of(&self, user: &UserId) -> Result<Vec<Username>, FollowPersistenceError>;

    /// Usernames of the users `user` follows, alphabetically.
    async fn following_of(&self, user: &UserId) -> Result<Vec<Username>, FollowPersistenceError>;

    /// Follower totals for each of `users`. Users without followers may be
    /// absent from the map.
    async fn follower_counts(
        &self,
        users: &[UserId],
    ) -> Result<HashMap<UserId, u64>, FollowPersistenceError>;
}

//! Port for idea persistence.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Idea, IdeaId, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by idea repository adapters.
    pub enum IdeaPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "idea repository connection failed: {message}"; service_unavailable,
        /// Query or mutation failed during execution.
        Query { message: String } => "idea repository query failed: {message}"; internal,
    }
}

/// Storage of ideas. Listings are ordered oldest first.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdeaRepository: Send + Sync {
    /// Persist a new idea.
    async fn insert(&self, idea: &Idea) -> Result<(), IdeaPersistenceError>;

    /// Overwrite the text fields of an idea. Returns `false` when absent.
    async fn update(&self, idea: &Idea) -> Result<bool, IdeaPersistenceError>;

    /// Delete an idea. Returns `false` when absent.
    async fn delete(&self, id: &IdeaId) -> Result<bool, IdeaPersistenceError>;

    /// Fetch an idea by identifier.
    async fn find_by_id(&self, id: &IdeaId) -> Result<Option<Idea>, IdeaPersistenceError>;

    /// List every idea.
    async fn list(&self) -> Result<Vec<Idea>, IdeaPersistenceError>;

    /// List ideas created by `author`.
    async fn list_by_author(&self, author: &UserId) -> Result<Vec<Idea>, IdeaPersistenceError>;

    /// List ideas created inside the inclusive window; `None` leaves a side open.
    async fn list_created_between(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Idea>, IdeaPersistenceError>;
}

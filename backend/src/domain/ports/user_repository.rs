//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{EmailAddress, Role, User, UserId, Username};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}"; service_unavailable,
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}"; internal,
        /// A unique column (username or email) already holds the value.
        Duplicate { field: String } => "{field} is already registered"; conflict,
    }
}

/// Storage of user accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. Fails with `Duplicate` on a username/email clash.
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Replace the mutable fields of an existing user.
    ///
    /// Returns `false` when no row matched the id.
    async fn update(&self, user: &User) -> Result<bool, UserPersistenceError>;

    /// Change a user's role. Returns `false` when no row matched.
    async fn set_role(&self, id: &UserId, role: Role) -> Result<bool, UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user by (normalised) email.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user by exact username.
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// List every user, oldest first.
    async fn list(&self) -> Result<Vec<User>, UserPersistenceError>;

    /// Delete a user and their follow edges. Returns `false` when absent.
    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError>;

    /// Delete every user whose username contains `fragment`, ignoring case.
    ///
    /// Returns the number of deleted users.
    async fn delete_by_username_fragment(&self, fragment: &str)
    -> Result<u64, UserPersistenceError>;
}

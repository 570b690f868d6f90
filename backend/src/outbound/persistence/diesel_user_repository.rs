//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{EmailAddress, Role, User, UserId, Username};

use super::error_mapping::{map_diesel_error, map_pool_error, unique_violation};
use super::models::{UserRecord, UserRow};
use super::pool::DbPool;
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
///
/// Deleting a user removes their follow edges through `ON DELETE CASCADE`.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_error(error: diesel::result::Error) -> UserPersistenceError {
    if let Some(constraint) = unique_violation(&error) {
        let field = if constraint.contains("email") {
            "email"
        } else {
            "username"
        };
        return UserPersistenceError::duplicate(field);
    }
    map_diesel_error(
        error,
        UserPersistenceError::query,
        UserPersistenceError::connection,
    )
}

fn to_domain(row: UserRow) -> Result<User, UserPersistenceError> {
    User::try_from(row).map_err(UserPersistenceError::query)
}

/// Escape `LIKE` wildcards so the fragment matches literally.
fn like_pattern(fragment: &str) -> String {
    let escaped = fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserPersistenceError::connection))?;

        diesel::insert_into(users::table)
            .values(&UserRecord::from(user))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_error)
    }

    async fn update(&self, user: &User) -> Result<bool, UserPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserPersistenceError::connection))?;

        let updated = diesel::update(users::table.find(user.id.as_uuid()))
            .set(&UserRecord::from(user))
            .execute(&mut conn)
            .await
            .map_err(map_error)?;
        Ok(updated > 0)
    }

    async fn set_role(&self, id: &UserId, role: Role) -> Result<bool, UserPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserPersistenceError::connection))?;

        let updated = diesel::update(users::table.find(id.as_uuid()))
            .set(users::role.eq(role.as_str()))
            .execute(&mut conn)
            .await
            .map_err(map_error)?;
        Ok(updated > 0)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserPersistenceError::connection))?;

        users::table
            .find(id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_error)?
            .map(to_domain)
            .transpose()
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserPersistenceError::connection))?;

        users::table
            .filter(users::email.eq(email.as_str()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_error)?
            .map(to_domain)
            .transpose()
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserPersistenceError::connection))?;

        users::table
            .filter(users::username.eq(username.as_str()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_error)?
            .map(to_domain)
            .transpose()
    }

    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserPersistenceError::connection))?;

        let rows: Vec<UserRow> = users::table
            .order(users::created_at.asc())
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_error)?;
        rows.into_iter().map(to_domain).collect()
    }

    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserPersistenceError::connection))?;

        let deleted = diesel::delete(users::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_error)?;
        Ok(deleted > 0)
    }

    async fn delete_by_username_fragment(
        &self,
        fragment: &str,
    ) -> Result<u64, UserPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserPersistenceError::connection))?;

        let deleted = diesel::delete(users::table.filter(users::username.ilike(like_pattern(fragment))))
            .execute(&mut conn)
            .await
            .map_err(map_error)?;
        Ok(deleted as u64)
    }
}

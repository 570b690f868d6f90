//! PostgreSQL-backed `FollowRepository` implementation using Diesel ORM.
//!
//! Each follow relation is one row in `follows`, so following and
//! unfollowing are single-statement writes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use mockable::Clock;
use tracing::warn;
use uuid::Uuid;

use crate::domain::ports::{FollowPersistenceError, FollowRepository};
use crate::domain::{UserId, Username};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::NewFollowRow;
use super::pool::DbPool;
use super::schema::{follows, users};

/// Diesel-backed implementation of the `FollowRepository` port.
#[derive(Clone)]
pub struct DieselFollowRepository {
    pool: DbPool,
    clock: Arc<dyn Clock>,
}

impl DieselFollowRepository {
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

fn map_error(error: diesel::result::Error) -> FollowPersistenceError {
    map_diesel_error(
        error,
        FollowPersistenceError::query,
        FollowPersistenceError::connection,
    )
}

fn to_usernames(names: Vec<String>) -> Vec<Username> {
    names
        .into_iter()
        .filter_map(|name| match Username::new(name.as_str()) {
            Ok(username) => Some(username),
            Err(err) => {
                warn!(%name, error = %err, "skipping malformed stored username");
                None
            }
        })
        .collect()
}

#[async_trait]
impl FollowRepository for DieselFollowRepository {
    async fn insert_edge(
        &self,
        follower: &UserId,
        followee: &UserId,
    ) -> Result<bool, FollowPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, FollowPersistenceError::connection))?;

        let row = NewFollowRow {
            follower_id: *follower.as_uuid(),
            followee_id: *followee.as_uuid(),
            created_at: self.clock.utc(),
        };
        let inserted = diesel::insert_into(follows::table)
            .values(&row)
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_error)?;
        Ok(inserted > 0)
    }

    async fn delete_edge(
        &self,
        follower: &UserId,
        followee: &UserId,
    ) -> Result<bool, FollowPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, FollowPersistenceError::connection))?;

        let deleted =
            diesel::delete(follows::table.find((follower.as_uuid(), followee.as_uuid())))
                .execute(&mut conn)
                .await
                .map_err(map_error)?;
        Ok(deleted > 0)
    }

    async fn followers_of(&self, user: &UserId) -> Result<Vec<Username>, FollowPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, FollowPersistenceError::connection))?;

        let names: Vec<String> = users::table
            .filter(
                users::id.eq_any(
                    follows::table
                        .filter(follows::followee_id.eq(user.as_uuid()))
                        .select(follows::follower_id),
                ),
            )
            .order(users::username.asc())
            .select(users::username)
            .load(&mut conn)
            .await
            .map_err(map_error)?;
        Ok(to_usernames(names))
    }

    async fn following_of(&self, user: &UserId) -> Result<Vec<Username>, FollowPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, FollowPersistenceError::connection))?;

        let names: Vec<String> = users::table
            .filter(
                users::id.eq_any(
                    follows::table
                        .filter(follows::follower_id.eq(user.as_uuid()))
                        .select(follows::followee_id),
                ),
            )
            .order(users::username.asc())
            .select(users::username)
            .load(&mut conn)
            .await
            .map_err(map_error)?;
        Ok(to_usernames(names))
    }

    async fn follower_counts(
        &self,
        user_ids: &[UserId],
    ) -> Result<HashMap<UserId, u64>, FollowPersistenceError> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, FollowPersistenceError::connection))?;

        let ids: Vec<Uuid> = user_ids.iter().map(|id| *id.as_uuid()).collect();
        let rows: Vec<(Uuid, i64)> = follows::table
            .filter(follows::followee_id.eq_any(ids))
            .group_by(follows::followee_id)
            .select((follows::followee_id, count_star()))
            .load(&mut conn)
            .await
            .map_err(map_error)?;

        Ok(rows
            .into_iter()
            .map(|(id, count)| {
                (
                    UserId::from_uuid(id),
                    u64::try_from(count).unwrap_or_default(),
                )
            })
            .collect())
    }
}

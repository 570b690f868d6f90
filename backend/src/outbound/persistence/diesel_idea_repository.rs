//! PostgreSQL-backed `IdeaRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{IdeaPersistenceError, IdeaRepository};
use crate::domain::{Idea, IdeaId, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{IdeaRow, IdeaTextUpdate, NewIdeaRow};
use super::pool::DbPool;
use super::schema::ideas;

/// Diesel-backed implementation of the `IdeaRepository` port.
#[derive(Clone)]
pub struct DieselIdeaRepository {
    pool: DbPool,
}

impl DieselIdeaRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_error(error: diesel::result::Error) -> IdeaPersistenceError {
    map_diesel_error(
        error,
        IdeaPersistenceError::query,
        IdeaPersistenceError::connection,
    )
}

#[async_trait]
impl IdeaRepository for DieselIdeaRepository {
    async fn insert(&self, idea: &Idea) -> Result<(), IdeaPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, IdeaPersistenceError::connection))?;

        diesel::insert_into(ideas::table)
            .values(&NewIdeaRow::from(idea))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_error)
    }

    async fn update(&self, idea: &Idea) -> Result<bool, IdeaPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, IdeaPersistenceError::connection))?;

        let changes = IdeaTextUpdate {
            title: &idea.title,
            description: &idea.description,
            market: &idea.market,
            target_audience: &idea.target_audience,
        };
        let updated = diesel::update(ideas::table.find(idea.id.as_uuid()))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(map_error)?;
        Ok(updated > 0)
    }

    async fn delete(&self, id: &IdeaId) -> Result<bool, IdeaPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, IdeaPersistenceError::connection))?;

        let deleted = diesel::delete(ideas::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_error)?;
        Ok(deleted > 0)
    }

    async fn find_by_id(&self, id: &IdeaId) -> Result<Option<Idea>, IdeaPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, IdeaPersistenceError::connection))?;

        let row: Option<IdeaRow> = ideas::table
            .find(id.as_uuid())
            .select(IdeaRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_error)?;
        Ok(row.map(Idea::from))
    }

    async fn list(&self) -> Result<Vec<Idea>, IdeaPersistenceError> {
        self.list_created_between(None, None).await
    }

    async fn list_by_author(&self, author: &UserId) -> Result<Vec<Idea>, IdeaPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, IdeaPersistenceError::connection))?;

        let rows: Vec<IdeaRow> = ideas::table
            .filter(ideas::created_by.eq(author.as_uuid()))
            .order(ideas::created_at.asc())
            .select(IdeaRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_error)?;
        Ok(rows.into_iter().map(Idea::from).collect())
    }

    async fn list_created_between(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Idea>, IdeaPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, IdeaPersistenceError::connection))?;

        let mut query = ideas::table.select(IdeaRow::as_select()).into_boxed();
        if let Some(from) = from {
            query = query.filter(ideas::created_at.ge(from));
        }
        if let Some(to) = to {
            query = query.filter(ideas::created_at.le(to));
        }
        let rows: Vec<IdeaRow> = query
            .order(ideas::created_at.asc())
            .load(&mut conn)
            .await
            .map_err(map_error)?;
        Ok(rows.into_iter().map(Idea::from).collect())
    }
}

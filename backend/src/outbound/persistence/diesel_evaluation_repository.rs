//! PostgreSQL-backed `EvaluationRepository` implementation using Diesel ORM.
//!
//! Rating and liking are single `INSERT .. ON CONFLICT (idea_id, user_id)
//! DO UPDATE` statements, so concurrent first writes for the same pair
//! cannot produce duplicates.

use std::sync::Arc;

use async_trait::async_trait;
use diesel::dsl::not;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use mockable::Clock;
use tracing::warn;
use uuid::Uuid;

use crate::domain::ports::{EvaluationPersistenceError, EvaluationRepository, EvaluationScan};
use crate::domain::{Evaluation, EvaluationKey, EvaluationPatch, IdeaId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{EvaluationChanges, EvaluationRow, NewEvaluationRow};
use super::pool::DbPool;
use super::schema::evaluations;

/// Diesel-backed implementation of the `EvaluationRepository` port.
#[derive(Clone)]
pub struct DieselEvaluationRepository {
    pool: DbPool,
    clock: Arc<dyn Clock>,
}

impl DieselEvaluationRepository {
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

fn map_error(error: diesel::result::Error) -> EvaluationPersistenceError {
    map_diesel_error(
        error,
        EvaluationPersistenceError::query,
        EvaluationPersistenceError::connection,
    )
}

fn to_domain(row: EvaluationRow) -> Result<Evaluation, EvaluationPersistenceError> {
    Evaluation::try_from(row).map_err(EvaluationPersistenceError::query)
}

#[async_trait]
impl EvaluationRepository for DieselEvaluationRepository {
    async fn upsert(
        &self,
        key: EvaluationKey,
        patch: &EvaluationPatch,
    ) -> Result<Evaluation, EvaluationPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, EvaluationPersistenceError::connection))?;

        let now = self.clock.utc();
        let score = patch.score.map(|score| i16::from(score.get()));
        let fresh = NewEvaluationRow {
            id: Uuid::new_v4(),
            idea_id: *key.idea_id.as_uuid(),
            user_id: *key.user_id.as_uuid(),
            score,
            comment: patch.comment.as_deref(),
            liked: patch.liked.unwrap_or(false),
            updated_at: now,
        };
        let changes = EvaluationChanges {
            score,
            comment: patch.comment.as_deref(),
            liked: patch.liked,
            updated_at: now,
        };

        let row: EvaluationRow = diesel::insert_into(evaluations::table)
            .values(&fresh)
            .on_conflict((evaluations::idea_id, evaluations::user_id))
            .do_update()
            .set(&changes)
            .returning(EvaluationRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_error)?;
        to_domain(row)
    }

    async fn toggle_like(&self, key: EvaluationKey) -> Result<bool, EvaluationPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, EvaluationPersistenceError::connection))?;

        let now = self.clock.utc();
        let first_like = NewEvaluationRow {
            id: Uuid::new_v4(),
            idea_id: *key.idea_id.as_uuid(),
            user_id: *key.user_id.as_uuid(),
            score: None,
            comment: Some(""),
            liked: true,
            updated_at: now,
        };

        diesel::insert_into(evaluations::table)
            .values(&first_like)
            .on_conflict((evaluations::idea_id, evaluations::user_id))
            .do_update()
            .set((
                evaluations::liked.eq(not(evaluations::liked)),
                evaluations::updated_at.eq(now),
            ))
            .returning(evaluations::liked)
            .get_result(&mut conn)
            .await
            .map_err(map_error)
    }

    async fn find(
        &self,
        key: EvaluationKey,
    ) -> Result<Option<Evaluation>, EvaluationPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, EvaluationPersistenceError::connection))?;

        evaluations::table
            .filter(evaluations::idea_id.eq(key.idea_id.as_uuid()))
            .filter(evaluations::user_id.eq(key.user_id.as_uuid()))
            .select(EvaluationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_error)?
            .map(to_domain)
            .transpose()
    }

    async fn list(&self) -> Result<EvaluationScan, EvaluationPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, EvaluationPersistenceError::connection))?;

        let rows: Vec<EvaluationRow> = evaluations::table
            .order(evaluations::updated_at.asc())
            .select(EvaluationRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_error)?;

        let mut scan = EvaluationScan::default();
        for row in rows {
            match Evaluation::try_from(row) {
                Ok(evaluation) => scan.evaluations.push(evaluation),
                Err(message) => {
                    warn!(%message, "skipping malformed evaluation row");
                    scan.skipped += 1;
                }
            }
        }
        Ok(scan)
    }

    async fn list_for_ideas(
        &self,
        ideas: &[IdeaId],
    ) -> Result<Vec<Evaluation>, EvaluationPersistenceError> {
        if ideas.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, EvaluationPersistenceError::connection))?;

        let ids: Vec<Uuid> = ideas.iter().map(|id| *id.as_uuid()).collect();
        let rows: Vec<EvaluationRow> = evaluations::table
            .filter(evaluations::idea_id.eq_any(ids))
            .order(evaluations::updated_at.asc())
            .select(EvaluationRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_error)?;
        rows.into_iter().map(to_domain).collect()
    }
}

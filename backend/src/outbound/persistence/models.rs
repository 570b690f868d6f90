//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions into domain types validate
//! stored values and report malformed rows as plain messages.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use tracing::warn;
use uuid::Uuid;

use crate::domain::{
    EmailAddress, Evaluation, EvaluationId, Idea, IdeaId, PasswordDigest, Role, Score, User,
    UserId, UserProfile, Username,
};

use super::schema::{evaluations, follows, ideas, users};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub skills: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = String;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let username = Username::new(row.username)
            .map_err(|err| format!("stored username for {} is invalid: {err}", row.id))?;
        let email = EmailAddress::new(&row.email)
            .map_err(|err| format!("stored email for {} is invalid: {err}", row.id))?;
        let role = row.role.parse::<Role>().unwrap_or_else(|_| {
            warn!(value = %row.role, user_id = %row.id, "unrecognised role, defaulting to user");
            Role::User
        });
        Ok(User {
            id: UserId::from_uuid(row.id),
            username,
            email,
            password_hash: PasswordDigest::new(row.password_hash),
            role,
            profile: UserProfile {
                title: row.title,
                description: row.description,
                location: row.location,
                skills: row.skills,
            },
            created_at: row.created_at,
        })
    }
}

/// Insertable and changeset view of a full user record.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserRecord<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub location: Option<&'a str>,
    pub skills: &'a [String],
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a User> for UserRecord<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            id: *user.id.as_uuid(),
            username: user.username.as_str(),
            email: user.email.as_str(),
            password_hash: user.password_hash.as_str(),
            role: user.role.as_str(),
            title: user.profile.title.as_deref(),
            description: user.profile.description.as_deref(),
            location: user.profile.location.as_deref(),
            skills: &user.profile.skills,
            created_at: user.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Follows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = follows)]
pub(crate) struct NewFollowRow {
    pub follower_id: Uuid,
    pub followee_id: Uuid,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Ideas
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = ideas)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct IdeaRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub market: String,
    pub target_audience: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<IdeaRow> for Idea {
    fn from(row: IdeaRow) -> Self {
        Self {
            id: IdeaId::from_uuid(row.id),
            title: row.title,
            description: row.description,
            market: row.market,
            target_audience: row.target_audience,
            created_by: UserId::from_uuid(row.created_by),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = ideas)]
pub(crate) struct NewIdeaRow<'a> {
    pub id: Uuid,
    pub title: &'a str,
    pub description: &'a str,
    pub market: &'a str,
    pub target_audience: &'a str,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a Idea> for NewIdeaRow<'a> {
    fn from(idea: &'a Idea) -> Self {
        Self {
            id: *idea.id.as_uuid(),
            title: &idea.title,
            description: &idea.description,
            market: &idea.market,
            target_audience: &idea.target_audience,
            created_by: *idea.created_by.as_uuid(),
            created_at: idea.created_at,
        }
    }
}

/// Only the text fields of an idea are mutable.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = ideas)]
pub(crate) struct IdeaTextUpdate<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub market: &'a str,
    pub target_audience: &'a str,
}

// ---------------------------------------------------------------------------
// Evaluations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = evaluations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct EvaluationRow {
    pub id: Uuid,
    pub idea_id: Uuid,
    pub user_id: Uuid,
    pub score: Option<i16>,
    pub comment: Option<String>,
    pub liked: bool,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<EvaluationRow> for Evaluation {
    type Error = String;

    fn try_from(row: EvaluationRow) -> Result<Self, Self::Error> {
        let score = row
            .score
            .map(|raw| Score::new(i64::from(raw)))
            .transpose()
            .map_err(|err| format!("evaluation {} has {err}", row.id))?;
        Ok(Evaluation {
            id: EvaluationId::from_uuid(row.id),
            idea_id: IdeaId::from_uuid(row.idea_id),
            user_id: UserId::from_uuid(row.user_id),
            score,
            comment: row.comment,
            liked: row.liked,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = evaluations)]
pub(crate) struct NewEvaluationRow<'a> {
    pub id: Uuid,
    pub idea_id: Uuid,
    pub user_id: Uuid,
    pub score: Option<i16>,
    pub comment: Option<&'a str>,
    pub liked: bool,
    pub updated_at: DateTime<Utc>,
}

/// Upsert changeset; `None` fields keep their stored value.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = evaluations)]
pub(crate) struct EvaluationChanges<'a> {
    pub score: Option<i16>,
    pub comment: Option<&'a str>,
    pub liked: Option<bool>,
    pub updated_at: DateTime<Utc>,
}

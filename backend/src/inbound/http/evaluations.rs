//! Evaluations API handlers.
//!
//! A user holds at most one evaluation per idea. Rating and liking both
//! upsert that record, and only the evaluating user may write it.

use actix_web::{get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    ApiResult, Error, Evaluation, EvaluationKey, EvaluationLine, EvaluationPatch, IdeaId, User,
    UserId,
};
use crate::inbound::http::bearer::AuthenticatedUser;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, missing_field_error, parse_idea_id, parse_score, parse_user_id,
};

const IDEA_ID: FieldName = FieldName::new("idea_id");
const USER_ID: FieldName = FieldName::new("user_id");

/// Fields written by a rating. Absent fields keep their stored value.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct EvaluationBody {
    /// Integer from 1 to 5.
    pub score: Option<i64>,
    pub comment: Option<String>,
    pub liked: Option<bool>,
}

impl TryFrom<EvaluationBody> for EvaluationPatch {
    type Error = Error;

    fn try_from(value: EvaluationBody) -> Result<Self, Self::Error> {
        Ok(Self {
            score: value
                .score
                .map(|score| parse_score(score, FieldName::new("score")))
                .transpose()?,
            comment: value.comment,
            liked: value.liked,
        })
    }
}

/// Rating body naming the pair it applies to.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct EvaluationRequest {
    pub idea_id: String,
    pub user_id: String,
    #[serde(flatten)]
    pub fields: EvaluationBody,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LikeQuery {
    pub user_id: Option<String>,
    pub idea_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EvaluationResponse {
    pub id: String,
    pub idea_id: String,
    pub user_id: String,
    pub score: Option<u8>,
    pub comment: Option<String>,
    pub liked: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<Evaluation> for EvaluationResponse {
    fn from(evaluation: Evaluation) -> Self {
        Self {
            id: evaluation.id.to_string(),
            idea_id: evaluation.idea_id.to_string(),
            user_id: evaluation.user_id.to_string(),
            score: evaluation.score.map(|score| score.get()),
            comment: evaluation.comment,
            liked: evaluation.liked,
            updated_at: evaluation.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LikeToggleResponse {
    /// Like state after the toggle.
    pub liked: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LikeCountResponse {
    pub idea_id: String,
    pub like_count: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LikedUsernamesResponse {
    pub idea_id: String,
    pub liked_usernames: Vec<String>,
}

/// One line of an idea's evaluation summary.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EvaluationLineResponse {
    pub username: String,
    pub idea_title: String,
    pub score: Option<u8>,
    pub comment: String,
    /// Mean score of the idea, rounded to two decimals.
    pub avg_score: f64,
}

impl From<EvaluationLine> for EvaluationLineResponse {
    fn from(line: EvaluationLine) -> Self {
        Self {
            username: line.username,
            idea_title: line.idea_title,
            score: line.score.map(|score| score.get()),
            comment: line.comment,
            avg_score: line.avg_score,
        }
    }
}

fn key_for_caller(caller: &User, idea_id: IdeaId, user_id: UserId) -> Result<EvaluationKey, Error> {
    if caller.id != user_id {
        return Err(Error::forbidden("you may only evaluate ideas as yourself"));
    }
    Ok(EvaluationKey { idea_id, user_id })
}

async fn rate_as(
    state: &HttpState,
    caller: &User,
    ids: (&str, &str),
    body: EvaluationBody,
) -> ApiResult<web::Json<EvaluationResponse>> {
    let (idea_id, user_id) = ids;
    let idea_id = parse_idea_id(idea_id, IDEA_ID)?;
    let user_id = parse_user_id(user_id, USER_ID)?;
    let key = key_for_caller(caller, idea_id, user_id)?;
    let patch = EvaluationPatch::try_from(body)?;
    let evaluation = state.evaluations.rate(key, &patch).await?;
    Ok(web::Json(evaluation.into()))
}

/// Rate, comment on, or like an idea.
#[utoipa::path(
    post,
    path = "/evaluations/",
    request_body = EvaluationRequest,
    responses(
        (status = 200, description = "Stored evaluation", body = EvaluationResponse),
        (status = 400, description = "Invalid request or own idea", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Caller is not the evaluating user", body = Error),
        (status = 404, description = "User or idea not found", body = Error)
    ),
    tags = ["evaluations"],
    operation_id = "evaluateIdea",
    security(("bearer" = []))
)]
#[post("/")]
pub async fn evaluate(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    payload: web::Json<EvaluationRequest>,
) -> ApiResult<web::Json<EvaluationResponse>> {
    let EvaluationRequest {
        idea_id,
        user_id,
        fields,
    } = payload.into_inner();
    rate_as(&state, &caller.0, (&idea_id, &user_id), fields).await
}

/// Rate an idea, naming the pair in the path.
#[utoipa::path(
    post,
    path = "/evaluations/{idea_id}/{user_id}/",
    params(
        ("idea_id" = String, Path, description = "Idea being evaluated"),
        ("user_id" = String, Path, description = "Evaluating user")
    ),
    request_body = EvaluationBody,
    responses(
        (status = 200, description = "Stored evaluation", body = EvaluationResponse),
        (status = 400, description = "Invalid request or own idea", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Caller is not the evaluating user", body = Error),
        (status = 404, description = "User or idea not found", body = Error)
    ),
    tags = ["evaluations"],
    operation_id = "evaluateIdeaByPath",
    security(("bearer" = []))
)]
#[post("/{idea_id}/{user_id}/")]
pub async fn evaluate_by_path(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<(String, String)>,
    payload: web::Json<EvaluationBody>,
) -> ApiResult<web::Json<EvaluationResponse>> {
    let (idea_id, user_id) = path.into_inner();
    rate_as(&state, &caller.0, (&idea_id, &user_id), payload.into_inner()).await
}

/// Flip the caller's like on an idea.
#[utoipa::path(
    post,
    path = "/evaluations/like",
    params(LikeQuery),
    responses(
        (status = 200, description = "New like state", body = LikeToggleResponse),
        (status = 400, description = "Invalid request or own idea", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Caller is not the liking user", body = Error),
        (status = 404, description = "User or idea not found", body = Error)
    ),
    tags = ["evaluations"],
    operation_id = "toggleLike",
    security(("bearer" = []))
)]
#[post("/like")]
pub async fn toggle_like(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    query: web::Query<LikeQuery>,
) -> ApiResult<web::Json<LikeToggleResponse>> {
    let LikeQuery { user_id, idea_id } = query.into_inner();
    let user_id = user_id.ok_or_else(|| missing_field_error(USER_ID))?;
    let idea_id = idea_id.ok_or_else(|| missing_field_error(IDEA_ID))?;
    let key = key_for_caller(
        &caller.0,
        parse_idea_id(&idea_id, IDEA_ID)?,
        parse_user_id(&user_id, USER_ID)?,
    )?;
    let liked = state.evaluations.toggle_like(key).await?;
    Ok(web::Json(LikeToggleResponse { liked }))
}

/// Every stored evaluation.
#[utoipa::path(
    get,
    path = "/evaluations/",
    responses(
        (status = 200, description = "Evaluations", body = [EvaluationResponse]),
        (status = 404, description = "No evaluations yet", body = Error)
    ),
    tags = ["evaluations"],
    operation_id = "listEvaluations",
    security([])
)]
#[get("/")]
pub async fn list_evaluations(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<EvaluationResponse>>> {
    all_evaluations(state).await
}

/// Same as `GET /evaluations/`, under the path the web client calls.
#[utoipa::path(
    get,
    path = "/evaluations/getall/",
    responses(
        (status = 200, description = "Evaluations", body = [EvaluationResponse]),
        (status = 404, description = "No evaluations yet", body = Error)
    ),
    tags = ["evaluations"],
    operation_id = "getAllEvaluations",
    security([])
)]
#[get("/getall/")]
pub async fn get_all_evaluations(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<EvaluationResponse>>> {
    all_evaluations(state).await
}

async fn all_evaluations(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<EvaluationResponse>>> {
    let evaluations = state.evaluations.list_all().await?;
    Ok(web::Json(evaluations.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/evaluations/likes/count/{idea_id}",
    params(("idea_id" = String, Path, description = "Idea id")),
    responses(
        (status = 200, description = "Like count", body = LikeCountResponse),
        (status = 400, description = "Invalid request", body = Error)
    ),
    tags = ["evaluations"],
    operation_id = "likeCount",
    security([])
)]
#[get("/likes/count/{idea_id}")]
pub async fn like_count(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<LikeCountResponse>> {
    let idea_id = parse_idea_id(&path.into_inner(), IDEA_ID)?;
    let like_count = state.evaluations.like_count(&idea_id).await?;
    Ok(web::Json(LikeCountResponse {
        idea_id: idea_id.to_string(),
        like_count,
    }))
}

#[utoipa::path(
    get,
    path = "/evaluations/likes/usernames/{idea_id}",
    params(("idea_id" = String, Path, description = "Idea id")),
    responses(
        (status = 200, description = "Users who liked the idea", body = LikedUsernamesResponse),
        (status = 400, description = "Invalid request", body = Error)
    ),
    tags = ["evaluations"],
    operation_id = "likedUsernames",
    security([])
)]
#[get("/likes/usernames/{idea_id}")]
pub async fn liked_usernames(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<LikedUsernamesResponse>> {
    let idea_id = parse_idea_id(&path.into_inner(), IDEA_ID)?;
    let summary = state.evaluations.liked_usernames(&idea_id).await?;
    Ok(web::Json(LikedUsernamesResponse {
        idea_id: summary.idea_id.to_string(),
        liked_usernames: summary.usernames.into_iter().map(String::from).collect(),
    }))
}

/// Every evaluation of an idea with the idea's mean score.
#[utoipa::path(
    get,
    path = "/evaluations/vratisveocene/{idea_id}",
    params(("idea_id" = String, Path, description = "Idea id")),
    responses(
        (status = 200, description = "Evaluation summary", body = [EvaluationLineResponse]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Idea has no evaluations", body = Error)
    ),
    tags = ["evaluations"],
    operation_id = "evaluationSummary",
    security([])
)]
#[get("/vratisveocene/{idea_id}")]
pub async fn evaluation_summary(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<EvaluationLineResponse>>> {
    let idea_id = parse_idea_id(&path.into_inner(), IDEA_ID)?;
    let lines = state.evaluations.summary(&idea_id).await?;
    Ok(web::Json(lines.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
#[path = "evaluations_tests.rs"]
mod tests;

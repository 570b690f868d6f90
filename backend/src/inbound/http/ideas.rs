//! Ideas API handlers.
//!
//! ```text
//! POST   /ideas/ {"title":"..","description":"..","market":"..","target_audience":".."}
//! GET    /ideas/filter-ideje/?min_likes=1&min_score=3.5
//! PATCH  /ideas/{idea_id} {"title":".."}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    ApiResult, Error, Idea, IdeaDraft, IdeaFilter, IdeaPatch, IdeaText, RankedIdea,
};
use crate::inbound::http::bearer::AuthenticatedUser;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, idea_text_error, parse_count_threshold, parse_idea_id,
    parse_optional_rfc3339_timestamp, parse_score_threshold, parse_user_id,
};

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct IdeaRequest {
    pub title: String,
    pub description: String,
    pub market: String,
    pub target_audience: String,
}

impl TryFrom<IdeaRequest> for IdeaDraft {
    type Error = Error;

    fn try_from(value: IdeaRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(
            &value.title,
            &value.description,
            &value.market,
            &value.target_audience,
        )
        .map_err(idea_text_error)
    }
}

/// Partial idea update. Supplied fields must not be blank.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct IdeaUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub market: Option<String>,
    pub target_audience: Option<String>,
}

fn optional_text(field: &'static str, value: Option<String>) -> Result<Option<IdeaText>, Error> {
    value
        .map(|raw| IdeaText::new(field, raw))
        .transpose()
        .map_err(idea_text_error)
}

impl TryFrom<IdeaUpdateRequest> for IdeaPatch {
    type Error = Error;

    fn try_from(value: IdeaUpdateRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            title: optional_text("title", value.title)?,
            description: optional_text("description", value.description)?,
            market: optional_text("market", value.market)?,
            target_audience: optional_text("target_audience", value.target_audience)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IdeaResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub market: String,
    pub target_audience: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl From<Idea> for IdeaResponse {
    fn from(idea: Idea) -> Self {
        Self {
            id: idea.id.to_string(),
            title: idea.title,
            description: idea.description,
            market: idea.market,
            target_audience: idea.target_audience,
            created_by: idea.created_by.to_string(),
            created_at: idea.created_at,
        }
    }
}

/// An idea with the figures it was ranked by.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RankedIdeaResponse {
    #[serde(flatten)]
    pub idea: IdeaResponse,
    pub likes: u64,
    pub avg_score: f64,
    /// Follower count of the idea's author.
    pub followers: u64,
}

impl From<RankedIdea> for RankedIdeaResponse {
    fn from(ranked: RankedIdea) -> Self {
        Self {
            idea: ranked.idea.into(),
            likes: ranked.likes,
            avg_score: ranked.avg_score,
            followers: ranked.followers,
        }
    }
}

/// Raw ranking thresholds. Parsed into an [`IdeaFilter`] by the handler.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct FilterQuery {
    /// Minimum number of likes.
    pub min_likes: Option<String>,
    /// Minimum mean score.
    pub min_score: Option<String>,
    /// Minimum follower count of the author.
    pub min_followers: Option<String>,
    /// Earliest creation time, RFC 3339, inclusive.
    pub min_created_at: Option<String>,
    /// Latest creation time, RFC 3339, inclusive.
    pub max_created_at: Option<String>,
}

impl TryFrom<FilterQuery> for IdeaFilter {
    type Error = Error;

    fn try_from(value: FilterQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            min_created_at: parse_optional_rfc3339_timestamp(
                value.min_created_at,
                FieldName::new("min_created_at"),
            )?,
            max_created_at: parse_optional_rfc3339_timestamp(
                value.max_created_at,
                FieldName::new("max_created_at"),
            )?,
            min_likes: parse_count_threshold(value.min_likes, FieldName::new("min_likes"))?,
            min_score: parse_score_threshold(value.min_score, FieldName::new("min_score"))?,
            min_followers: parse_count_threshold(
                value.min_followers,
                FieldName::new("min_followers"),
            )?,
        })
    }
}

const IDEA_ID: FieldName = FieldName::new("idea_id");

fn to_responses(ideas: Vec<Idea>) -> Vec<IdeaResponse> {
    ideas.into_iter().map(IdeaResponse::from).collect()
}

/// Post a new idea owned by the caller.
#[utoipa::path(
    post,
    path = "/ideas/",
    request_body = IdeaRequest,
    responses(
        (status = 201, description = "Idea created", body = IdeaResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["ideas"],
    operation_id = "createIdea",
    security(("bearer" = []))
)]
#[post("/")]
pub async fn create_idea(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    payload: web::Json<IdeaRequest>,
) -> ApiResult<HttpResponse> {
    let draft = IdeaDraft::try_from(payload.into_inner())?;
    let idea = state.ideas.create(&caller.into_inner(), draft).await?;
    Ok(HttpResponse::Created().json(IdeaResponse::from(idea)))
}

/// Every idea, oldest first.
#[utoipa::path(
    get,
    path = "/ideas/",
    responses(
        (status = 200, description = "Ideas", body = [IdeaResponse]),
        (status = 404, description = "No ideas yet", body = Error)
    ),
    tags = ["ideas"],
    operation_id = "listIdeas",
    security([])
)]
#[get("/")]
pub async fn list_ideas(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<IdeaResponse>>> {
    let ideas = state.ideas.list().await?;
    Ok(web::Json(to_responses(ideas)))
}

/// Ideas posted by one user.
#[utoipa::path(
    get,
    path = "/ideas/userideas/{user_id}/",
    params(("user_id" = String, Path, description = "Author id")),
    responses(
        (status = 200, description = "Ideas by the user", body = [IdeaResponse]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "User has no ideas", body = Error)
    ),
    tags = ["ideas"],
    operation_id = "listUserIdeas",
    security([])
)]
#[get("/userideas/{user_id}/")]
pub async fn user_ideas(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<IdeaResponse>>> {
    let author = parse_user_id(&path.into_inner(), FieldName::new("user_id"))?;
    let ideas = state.ideas.list_by_author(&author).await?;
    Ok(web::Json(to_responses(ideas)))
}

/// Rank ideas by likes, mean score, author followers, then recency.
#[utoipa::path(
    get,
    path = "/ideas/filter-ideje/",
    params(FilterQuery),
    responses(
        (status = 200, description = "Matching ideas, best first", body = [RankedIdeaResponse]),
        (status = 400, description = "Invalid request", body = Error)
    ),
    tags = ["ideas"],
    operation_id = "filterIdeas",
    security([])
)]
#[get("/filter-ideje/")]
pub async fn filter_ideas(
    state: web::Data<HttpState>,
    query: web::Query<FilterQuery>,
) -> ApiResult<web::Json<Vec<RankedIdeaResponse>>> {
    let filter = IdeaFilter::try_from(query.into_inner())?;
    let ranked = state.ideas.filter(&filter).await?;
    Ok(web::Json(ranked.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/ideas/{idea_id}",
    params(("idea_id" = String, Path, description = "Idea id")),
    responses(
        (status = 200, description = "Idea", body = IdeaResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["ideas"],
    operation_id = "getIdea",
    security([])
)]
#[get("/{idea_id}")]
pub async fn get_idea(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<IdeaResponse>> {
    let id = parse_idea_id(&path.into_inner(), IDEA_ID)?;
    let idea = state.ideas.get(&id).await?;
    Ok(web::Json(idea.into()))
}

/// Edit an idea. Only its author may do this.
#[utoipa::path(
    patch,
    path = "/ideas/{idea_id}",
    params(("idea_id" = String, Path, description = "Idea id")),
    request_body = IdeaUpdateRequest,
    responses(
        (status = 200, description = "Updated idea", body = IdeaResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["ideas"],
    operation_id = "updateIdea",
    security(("bearer" = []))
)]
#[patch("/{idea_id}")]
pub async fn update_idea(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<String>,
    payload: web::Json<IdeaUpdateRequest>,
) -> ApiResult<web::Json<IdeaResponse>> {
    let id = parse_idea_id(&path.into_inner(), IDEA_ID)?;
    let patch = IdeaPatch::try_from(payload.into_inner())?;
    let idea = state
        .ideas
        .update(&caller.into_inner(), &id, patch)
        .await?;
    Ok(web::Json(idea.into()))
}

/// Delete an idea. Allowed for its author and for admins.
#[utoipa::path(
    delete,
    path = "/ideas/{idea_id}",
    params(("idea_id" = String, Path, description = "Idea id")),
    responses(
        (status = 204, description = "Idea deleted"),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["ideas"],
    operation_id = "deleteIdea",
    security(("bearer" = []))
)]
#[delete("/{idea_id}")]
pub async fn delete_idea(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_idea_id(&path.into_inner(), IDEA_ID)?;
    state.ideas.delete(&caller.into_inner(), &id).await?;
    Ok(HttpResponse::NoContent().finish())
}

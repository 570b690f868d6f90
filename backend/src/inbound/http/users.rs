//! Users API handlers.
//!
//! ```text
//! GET    /users/me
//! PATCH  /users/me {"title":"Engineer"}
//! GET    /users/
//! POST   /users/follow/{username}
//! GET    /users/user-info/by-username/{username}
//! ```
//!
//! Responses never carry password hashes.

use actix_web::{HttpResponse, delete, get, patch, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    ApiResult, CreatorIdea, EmailAddress, Error, PlainPassword, Registration, RegistrationError,
    User, UserDetails, UserInfo, UserPatch, Username,
};
use crate::inbound::http::auth::{MessageResponse, RegisterRequest};
use crate::inbound::http::bearer::AuthenticatedUser;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, missing_field_error, parse_user_id, parse_username, registration_error,
};

/// Public view of a user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub email: String,
    /// `user` or `admin`.
    pub role: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub skills: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.to_string(),
            email: user.email.to_string(),
            role: user.role.as_str().to_owned(),
            title: user.profile.title.clone(),
            description: user.profile.description.clone(),
            location: user.profile.location.clone(),
            skills: user.profile.skills.clone(),
            created_at: user.created_at,
        }
    }
}

/// A user together with both sides of their follow edges.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserDetailsResponse {
    #[serde(flatten)]
    pub user: UserSummary,
    pub followers: Vec<String>,
    pub following: Vec<String>,
}

fn usernames(names: Vec<Username>) -> Vec<String> {
    names.into_iter().map(String::from).collect()
}

impl From<UserDetails> for UserDetailsResponse {
    fn from(details: UserDetails) -> Self {
        Self {
            user: UserSummary::from(&details.user),
            followers: usernames(details.followers),
            following: usernames(details.following),
        }
    }
}

/// Partial update of the caller's account. Absent fields are left alone.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub skills: Option<Vec<String>>,
}

impl TryFrom<UpdateUserRequest> for UserPatch {
    type Error = Error;

    fn try_from(value: UpdateUserRequest) -> Result<Self, Self::Error> {
        let username = value
            .username
            .map(Username::new)
            .transpose()
            .map_err(|err| registration_error(RegistrationError::Username(err)))?;
        let email = value
            .email
            .map(EmailAddress::new)
            .transpose()
            .map_err(|err| registration_error(RegistrationError::Email(err)))?;
        let password = value
            .password
            .as_deref()
            .map(PlainPassword::new)
            .transpose()
            .map_err(|err| registration_error(RegistrationError::Password(err)))?;
        Ok(Self {
            username,
            email,
            password,
            title: value.title,
            description: value.description,
            location: value.location,
            skills: value.skills,
        })
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DeleteByUsernameQuery {
    /// Case-insensitive fragment matched anywhere in the username.
    pub username: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeletedResponse {
    pub deleted: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IdeaHeadlineResponse {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserInfoResponse {
    pub username: String,
    pub email: String,
    pub title: Option<String>,
    pub ideas: Vec<IdeaHeadlineResponse>,
    pub followers: Vec<String>,
    pub following: Vec<String>,
}

impl From<UserInfo> for UserInfoResponse {
    fn from(info: UserInfo) -> Self {
        Self {
            username: info.username.into(),
            email: info.email.into(),
            title: info.title,
            ideas: info
                .ideas
                .into_iter()
                .map(|idea| IdeaHeadlineResponse {
                    id: idea.id.to_string(),
                    title: idea.title,
                })
                .collect(),
            followers: usernames(info.followers),
            following: usernames(info.following),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatorIdeaResponse {
    pub id: String,
    pub title: String,
    pub creator: String,
    pub followers_count: u64,
}

impl From<CreatorIdea> for CreatorIdeaResponse {
    fn from(idea: CreatorIdea) -> Self {
        Self {
            id: idea.id.to_string(),
            title: idea.title,
            creator: idea.creator.into(),
            followers_count: idea.followers_count,
        }
    }
}

const USERNAME: FieldName = FieldName::new("username");

/// Current user with follower and following usernames.
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Current user", body = UserDetailsResponse),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["users"],
    operation_id = "currentUser",
    security(("bearer" = []))
)]
#[get("/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
) -> ApiResult<web::Json<UserDetailsResponse>> {
    let details = state.accounts.details(caller.into_inner()).await?;
    Ok(web::Json(details.into()))
}

/// Update the caller's own account.
#[utoipa::path(
    patch,
    path = "/users/me",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = UserDetailsResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 409, description = "Username or email taken", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateCurrentUser",
    security(("bearer" = []))
)]
#[patch("/me")]
pub async fn update_current_user(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    payload: web::Json<UpdateUserRequest>,
) -> ApiResult<web::Json<UserDetailsResponse>> {
    apply_profile_update(state, caller, payload).await
}

/// Same as `PATCH /users/me`, under the path the web client calls.
#[utoipa::path(
    patch,
    path = "/users/updateMe",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = UserDetailsResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 409, description = "Username or email taken", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateMe",
    security(("bearer" = []))
)]
#[patch("/updateMe")]
pub async fn update_me(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    payload: web::Json<UpdateUserRequest>,
) -> ApiResult<web::Json<UserDetailsResponse>> {
    apply_profile_update(state, caller, payload).await
}

async fn apply_profile_update(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    payload: web::Json<UpdateUserRequest>,
) -> ApiResult<web::Json<UserDetailsResponse>> {
    let patch = UserPatch::try_from(payload.into_inner())?;
    let details = state
        .accounts
        .update_profile(&caller.into_inner(), patch)
        .await?;
    Ok(web::Json(details.into()))
}

/// List every user.
#[utoipa::path(
    get,
    path = "/users/",
    responses(
        (status = 200, description = "Users", body = [UserSummary]),
        (status = 404, description = "No users yet", body = Error)
    ),
    tags = ["users"],
    operation_id = "listUsers",
    security([])
)]
#[get("/")]
pub async fn list_users(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<UserSummary>>> {
    let users = state.accounts.list_users().await?;
    Ok(web::Json(users.iter().map(UserSummary::from).collect()))
}

/// Create a user. Same rules as registration.
#[utoipa::path(
    post,
    path = "/users/",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = UserSummary),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email or username taken", body = Error)
    ),
    tags = ["users"],
    operation_id = "createUser",
    security([])
)]
#[post("/")]
pub async fn create_user(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let registration = Registration::try_from(payload.into_inner())?;
    let user = state.accounts.create_user(registration).await?;
    Ok(HttpResponse::Created().json(UserSummary::from(&user)))
}

/// Delete users whose username contains a fragment. Admin only.
#[utoipa::path(
    delete,
    path = "/users/delete_by_username/",
    params(DeleteByUsernameQuery),
    responses(
        (status = 200, description = "Users deleted", body = DeletedResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "No users matched", body = Error)
    ),
    tags = ["users"],
    operation_id = "deleteUsersByUsername",
    security(("bearer" = []))
)]
#[delete("/delete_by_username/")]
pub async fn delete_by_username(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    query: web::Query<DeleteByUsernameQuery>,
) -> ApiResult<web::Json<DeletedResponse>> {
    let fragment = query
        .into_inner()
        .username
        .ok_or_else(|| missing_field_error(USERNAME))?;
    let deleted = state
        .accounts
        .delete_by_username(&caller.into_inner(), &fragment)
        .await?;
    Ok(web::Json(DeletedResponse { deleted }))
}

/// Follow another user.
#[utoipa::path(
    post,
    path = "/users/follow/{username}",
    params(("username" = String, Path, description = "User to follow")),
    responses(
        (status = 200, description = "Now following", body = MessageResponse),
        (status = 400, description = "Self-follow or already following", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "followUser",
    security(("bearer" = []))
)]
#[post("/follow/{username}")]
pub async fn follow(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<MessageResponse>> {
    let target = parse_username(&path.into_inner(), USERNAME)?;
    state.accounts.follow(&caller.into_inner(), &target).await?;
    Ok(web::Json(MessageResponse::new(format!(
        "you are now following {target}"
    ))))
}

/// Stop following another user.
#[utoipa::path(
    post,
    path = "/users/unfollow/{username}",
    params(("username" = String, Path, description = "User to unfollow")),
    responses(
        (status = 200, description = "No longer following", body = MessageResponse),
        (status = 400, description = "Invalid request or not following", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "unfollowUser",
    security(("bearer" = []))
)]
#[post("/unfollow/{username}")]
pub async fn unfollow(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<MessageResponse>> {
    let target = parse_username(&path.into_inner(), USERNAME)?;
    state.accounts.unfollow(&caller.into_inner(), &target).await?;
    Ok(web::Json(MessageResponse::new(format!(
        "you unfollowed {target}"
    ))))
}

/// Usernames following `username`.
#[utoipa::path(
    get,
    path = "/users/followers/{username}",
    params(("username" = String, Path, description = "Followed user")),
    responses(
        (status = 200, description = "Follower usernames", body = [String]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "listFollowers",
    security([])
)]
#[get("/followers/{username}")]
pub async fn followers(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<String>>> {
    let username = parse_username(&path.into_inner(), USERNAME)?;
    let names = state.accounts.followers(&username).await?;
    Ok(web::Json(usernames(names)))
}

/// Usernames `username` follows.
#[utoipa::path(
    get,
    path = "/users/following/{username}",
    params(("username" = String, Path, description = "Following user")),
    responses(
        (status = 200, description = "Followed usernames", body = [String]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "listFollowing",
    security([])
)]
#[get("/following/{username}")]
pub async fn following(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<String>>> {
    let username = parse_username(&path.into_inner(), USERNAME)?;
    let names = state.accounts.following(&username).await?;
    Ok(web::Json(usernames(names)))
}

/// Public info card for a user, including their ideas.
#[utoipa::path(
    get,
    path = "/users/user-info/by-username/{username}",
    params(("username" = String, Path, description = "User to describe")),
    responses(
        (status = 200, description = "User info", body = UserInfoResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "userInfo",
    security([])
)]
#[get("/user-info/by-username/{username}")]
pub async fn user_info(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserInfoResponse>> {
    let username = parse_username(&path.into_inner(), USERNAME)?;
    let info = state.accounts.user_info(&username).await?;
    Ok(web::Json(info.into()))
}

/// Every idea listed under its author, most-followed authors first.
#[utoipa::path(
    get,
    path = "/users/ideas/by-popular-creators",
    responses(
        (status = 200, description = "Ideas by author popularity", body = [CreatorIdeaResponse])
    ),
    tags = ["users"],
    operation_id = "ideasByPopularCreators",
    security([])
)]
#[get("/ideas/by-popular-creators")]
pub async fn ideas_by_popular_creators(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<CreatorIdeaResponse>>> {
    let ideas = state.ideas.by_popular_creators().await?;
    Ok(web::Json(ideas.into_iter().map(Into::into).collect()))
}

/// Look up one user by id.
#[utoipa::path(
    get,
    path = "/users/{user_id}",
    params(("user_id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserDetailsResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUser",
    security([])
)]
#[get("/{user_id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserDetailsResponse>> {
    let id = parse_user_id(&path.into_inner(), FieldName::new("user_id"))?;
    let details = state.accounts.get_user(&id).await?;
    Ok(web::Json(details.into()))
}

/// Delete an account. Users may delete themselves; admins anyone.
#[utoipa::path(
    delete,
    path = "/users/{user_id}",
    params(("user_id" = String, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "deleteUser",
    security(("bearer" = []))
)]
#[delete("/{user_id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_user_id(&path.into_inner(), FieldName::new("user_id"))?;
    state.accounts.delete_user(&caller.into_inner(), &id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests;

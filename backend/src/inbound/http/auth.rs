//! Authentication endpoints.
//!
//! ```text
//! POST /auth/register {"username":"mara","email":"mara@example.com","password":"hunter22"}
//! POST /auth/login    username=mara@example.com&password=hunter22
//! GET  /auth/admin/test
//! POST /auth/set-admin/{user_id}
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{
    ApiResult, Error, LoginCredentials, LoginValidationError, Registration, UserProfile,
};
use crate::inbound::http::bearer::{AdminUser, AuthenticatedUser};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_user_id, registration_error};

/// Account creation body shared by `POST /auth/register` and `POST /users/`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
}

impl TryFrom<RegisterRequest> for Registration {
    type Error = Error;

    fn try_from(value: RegisterRequest) -> Result<Self, Self::Error> {
        let profile = UserProfile {
            title: value.title,
            description: value.description,
            location: value.location,
            skills: value.skills.unwrap_or_default(),
        };
        Self::try_from_parts(&value.username, &value.email, &value.password, profile)
            .map_err(registration_error)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub user_id: String,
}

/// Login form. `username` carries the account email.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl TryFrom<LoginForm> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginForm) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.username, &value.password)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    let (field, code) = match err {
        LoginValidationError::EmptyEmail => ("username", "empty_username"),
        LoginValidationError::EmptyPassword => ("password", "empty_password"),
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field, "code": code }))
}

/// Create an account with the `user` role.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Invalid request or email taken", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["auth"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<web::Json<RegisterResponse>> {
    let registration = Registration::try_from(payload.into_inner())?;
    let user = state.accounts.register(registration).await?;
    Ok(web::Json(RegisterResponse {
        user_id: user.id.to_string(),
    }))
}

/// Exchange email and password for a bearer token.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    form: web::Form<LoginForm>,
) -> ApiResult<web::Json<TokenResponse>> {
    let credentials =
        LoginCredentials::try_from(form.into_inner()).map_err(map_login_validation_error)?;
    let token = state.accounts.login(&credentials).await?;
    Ok(web::Json(TokenResponse {
        access_token: token.token,
        token_type: "bearer".to_owned(),
    }))
}

/// Greet an administrator. Useful for checking admin tokens.
#[utoipa::path(
    get,
    path = "/auth/admin/test",
    responses(
        (status = 200, description = "Caller is an admin", body = MessageResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["auth"],
    operation_id = "adminTest",
    security(("bearer" = []))
)]
#[get("/admin/test")]
pub async fn admin_test(admin: AdminUser) -> web::Json<MessageResponse> {
    let AdminUser(user) = admin;
    web::Json(MessageResponse::new(format!(
        "welcome, admin {}",
        user.username
    )))
}

/// Grant the admin role to another user. Admin only.
#[utoipa::path(
    post,
    path = "/auth/set-admin/{user_id}",
    params(("user_id" = String, Path, description = "User to promote")),
    responses(
        (status = 200, description = "User promoted", body = MessageResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["auth"],
    operation_id = "setAdmin",
    security(("bearer" = []))
)]
#[post("/set-admin/{user_id}")]
pub async fn set_admin(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let target = parse_user_id(&path.into_inner(), FieldName::new("user_id"))?;
    state
        .accounts
        .promote_to_admin(&caller.into_inner(), &target)
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new(format!("user {target} is now an admin"))))
}

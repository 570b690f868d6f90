//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! document for the REST API. It registers:
//!
//! - **Paths**: every HTTP endpoint from the inbound layer (auth, users,
//!   ideas, evaluations, health)
//! - **Schemas**: the request and response DTOs plus the domain [`Error`]
//!   envelope and its [`ErrorCode`]
//! - **Security**: bearer token authentication scheme
//!
//! The generated document is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::auth::{
    LoginForm, MessageResponse, RegisterRequest, RegisterResponse, TokenResponse,
};
use crate::inbound::http::evaluations::{
    EvaluationBody, EvaluationLineResponse, EvaluationRequest, EvaluationResponse,
    LikeCountResponse, LikeToggleResponse, LikedUsernamesResponse,
};
use crate::inbound::http::ideas::{
    IdeaRequest, IdeaResponse, IdeaUpdateRequest, RankedIdeaResponse,
};
use crate::inbound::http::users::{
    CreatorIdeaResponse, DeletedResponse, IdeaHeadlineResponse, UpdateUserRequest,
    UserDetailsResponse, UserInfoResponse, UserSummary,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Access token issued by POST /auth/login."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Idea board API",
        description = "HTTP interface for accounts, follows, ideas, evaluations and health probes."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("bearer" = [])),
    paths(
        crate::inbound::http::auth::register,
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::admin_test,
        crate::inbound::http::auth::set_admin,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::update_current_user,
        crate::inbound::http::users::update_me,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::create_user,
        crate::inbound::http::users::delete_by_username,
        crate::inbound::http::users::follow,
        crate::inbound::http::users::unfollow,
        crate::inbound::http::users::followers,
        crate::inbound::http::users::following,
        crate::inbound::http::users::user_info,
        crate::inbound::http::users::ideas_by_popular_creators,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::ideas::create_idea,
        crate::inbound::http::ideas::list_ideas,
        crate::inbound::http::ideas::user_ideas,
        crate::inbound::http::ideas::filter_ideas,
        crate::inbound::http::ideas::get_idea,
        crate::inbound::http::ideas::update_idea,
        crate::inbound::http::ideas::delete_idea,
        crate::inbound::http::evaluations::evaluate,
        crate::inbound::http::evaluations::evaluate_by_path,
        crate::inbound::http::evaluations::toggle_like,
        crate::inbound::http::evaluations::list_evaluations,
        crate::inbound::http::evaluations::get_all_evaluations,
        crate::inbound::http::evaluations::like_count,
        crate::inbound::http::evaluations::liked_usernames,
        crate::inbound::http::evaluations::evaluation_summary,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        RegisterRequest,
        RegisterResponse,
        LoginForm,
        TokenResponse,
        MessageResponse,
        UserSummary,
        UserDetailsResponse,
        UpdateUserRequest,
        DeletedResponse,
        IdeaHeadlineResponse,
        UserInfoResponse,
        CreatorIdeaResponse,
        IdeaRequest,
        IdeaUpdateRequest,
        IdeaResponse,
        RankedIdeaResponse,
        EvaluationBody,
        EvaluationRequest,
        EvaluationResponse,
        LikeToggleResponse,
        LikeCountResponse,
        LikedUsernamesResponse,
        EvaluationLineResponse,
    )),
    tags(
        (name = "auth", description = "Registration, login and admin promotion"),
        (name = "users", description = "Profiles and follow relationships"),
        (name = "ideas", description = "Idea posts and ranking"),
        (name = "evaluations", description = "Scores, comments and likes"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

//! HTTP inbound adapter exposing REST endpoints.
//!
//! [`configure`] mounts every route. Handlers expect a
//! `web::Data<state::HttpState>` registered on the app.

use actix_web::web;

pub mod auth;
pub mod bearer;
pub mod error;
pub mod evaluations;
pub mod health;
pub mod ideas;
pub mod state;
pub mod token_config;
pub mod users;
pub mod validation;

/// Mount the API scopes and extractor error handlers.
///
/// Fixed paths are registered ahead of `/{id}` patterns in the same scope.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use ideaboard::inbound::http::configure;
///
/// let _app = App::new().configure(configure);
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    error::configure_extractors(cfg);
    cfg.service(
        web::scope("/auth")
            .service(auth::register)
            .service(auth::login)
            .service(auth::admin_test)
            .service(auth::set_admin),
    )
    .service(
        web::scope("/users")
            .service(users::current_user)
            .service(users::update_current_user)
            .service(users::update_me)
            .service(users::list_users)
            .service(users::create_user)
            .service(users::delete_by_username)
            .service(users::follow)
            .service(users::unfollow)
            .service(users::followers)
            .service(users::following)
            .service(users::user_info)
            .service(users::ideas_by_popular_creators)
            .service(users::get_user)
            .service(users::delete_user),
    )
    .service(
        web::scope("/ideas")
            .service(ideas::create_idea)
            .service(ideas::list_ideas)
            .service(ideas::user_ideas)
            .service(ideas::filter_ideas)
            .service(ideas::get_idea)
            .service(ideas::update_idea)
            .service(ideas::delete_idea),
    )
    .service(
        web::scope("/evaluations")
            .service(evaluations::evaluate)
            .service(evaluations::list_evaluations)
            .service(evaluations::get_all_evaluations)
            .service(evaluations::toggle_like)
            .service(evaluations::like_count)
            .service(evaluations::liked_usernames)
            .service(evaluations::evaluation_summary)
            .service(evaluations::evaluate_by_path),
    );
}

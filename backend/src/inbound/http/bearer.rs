//! Bearer-token extractors keeping handlers free of header parsing.
//!
//! [`AuthenticatedUser`] resolves `Authorization: Bearer <token>` to the
//! stored account; [`AdminUser`] additionally requires the admin role.

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::{AccountService, Error, User};
use crate::inbound::http::state::HttpState;

const BEARER_SCHEME: &str = "bearer";

/// Extract the raw token from an `Authorization` header value.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

fn token_from_request(req: &HttpRequest) -> Result<String, Error> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized("login required"))?;
    let value = header
        .to_str()
        .map_err(|_| Error::unauthorized("invalid or expired token"))?;
    bearer_token(value)
        .map(str::to_owned)
        .ok_or_else(|| Error::unauthorized("invalid or expired token"))
}

fn state_from_request(req: &HttpRequest) -> Result<web::Data<HttpState>, Error> {
    req.app_data::<web::Data<HttpState>>()
        .cloned()
        .ok_or_else(|| Error::internal("HTTP state is not registered"))
}

/// The caller identified by a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl AuthenticatedUser {
    pub fn into_inner(self) -> User {
        self.0
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let prepared = token_from_request(req)
            .and_then(|token| state_from_request(req).map(|state| (token, state)));
        Box::pin(async move {
            let (token, state) = prepared?;
            let user = state.accounts.authenticate(&token).await?;
            Ok(Self(user))
        })
    }
}

/// An authenticated caller holding the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequest for AdminUser {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = AuthenticatedUser::from_request(req, payload);
        Box::pin(async move {
            let AuthenticatedUser(user) = fut.await?;
            let admin = AccountService::require_admin(user)?;
            Ok(Self(admin))
        })
    }
}

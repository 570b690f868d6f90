//! Test utilities for the ideaboard crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Compiled for unit tests and when the `test-support` feature is enabled.

pub mod clock {
    //! Controllable clock for time-dependent tests.

    use std::sync::Mutex;

    use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
    use mockable::Clock;

    /// Clock that only moves when told to.
    pub struct MutableClock(Mutex<DateTime<Utc>>);

    impl MutableClock {
        pub fn new(now: DateTime<Utc>) -> Self {
            Self(Mutex::new(now))
        }

        /// A clock fixed at 2024-05-01T12:00:00Z.
        pub fn fixed() -> Self {
            match Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single() {
                Some(now) => Self::new(now),
                None => panic!("fixed clock timestamp must be valid"),
            }
        }

        pub fn advance_seconds(&self, seconds: i64) {
            *self.lock_clock() += TimeDelta::seconds(seconds);
        }

        fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
            match self.0.lock() {
                Ok(guard) => guard,
                Err(_) => panic!("clock mutex"),
            }
        }
    }

    impl Clock for MutableClock {
        fn local(&self) -> DateTime<Local> {
            self.utc().with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            *self.lock_clock()
        }
    }
}

pub mod hasher {
    //! Fast stand-in for the Argon2 hasher.

    use crate::domain::PasswordDigest;
    use crate::domain::ports::{CredentialHashError, CredentialHasher};

    const PREFIX: &str = "plain$";

    /// Stores passwords behind a marker prefix. Never use outside tests.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct PlainTextHasher;

    impl CredentialHasher for PlainTextHasher {
        fn hash(&self, plaintext: &str) -> Result<PasswordDigest, CredentialHashError> {
            Ok(PasswordDigest::new(format!("{PREFIX}{plaintext}")))
        }

        fn verify(&self, plaintext: &str, digest: &PasswordDigest) -> bool {
            digest.as_str().strip_prefix(PREFIX) == Some(plaintext)
        }
    }
}

pub mod app {
    //! HTTP state wired over the in-memory store, plus request helpers.

    use std::sync::Arc;

    use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
    use actix_web::{App, test as actix_test, web};
    use chrono::Duration;
    use serde_json::{Value, json};
    use zeroize::Zeroizing;

    use super::clock::MutableClock;
    use super::hasher::PlainTextHasher;
    use crate::domain::ports::UserRepository;
    use crate::domain::{Role, UserId};
    use crate::inbound::http::configure;
    use crate::inbound::http::state::{HttpState, HttpStatePorts};
    use crate::outbound::memory::MemoryStore;
    use crate::outbound::security::JwtTokenService;

    /// Signing secret used by test token services.
    pub const TEST_TOKEN_SECRET: &[u8] = b"ideaboard-test-secret-0123456789abcdef";

    /// Password used by [`register`].
    pub const TEST_PASSWORD: &str = "hunter22";

    /// Build application state backed by a fresh [`MemoryStore`].
    pub fn memory_state(clock: Arc<MutableClock>) -> HttpState {
        memory_state_with_store(clock).0
    }

    /// Like [`memory_state`], also returning the store for direct seeding.
    pub fn memory_state_with_store(clock: Arc<MutableClock>) -> (HttpState, MemoryStore) {
        let store = MemoryStore::new(clock.clone());
        let ports = HttpStatePorts {
            users: Arc::new(store.clone()),
            follows: Arc::new(store.clone()),
            ideas: Arc::new(store.clone()),
            evaluations: Arc::new(store.clone()),
            hasher: Arc::new(PlainTextHasher),
            tokens: Arc::new(JwtTokenService::new(
                Zeroizing::new(TEST_TOKEN_SECRET.to_vec()),
                clock.clone(),
            )),
        };
        (HttpState::new(ports, clock, Duration::minutes(60)), store)
    }

    /// Application with every route mounted over `state`.
    pub fn test_app(
        state: HttpState,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure)
    }

    /// Register `username` with the address `<username>@example.com`,
    /// returning the new user id.
    pub async fn register(
        app: &impl Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
        username: &str,
    ) -> String {
        let request = actix_test::TestRequest::post()
            .uri("/auth/register")
            .set_json(json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": TEST_PASSWORD,
            }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(app, request).await;
        match body.get("user_id").and_then(Value::as_str) {
            Some(id) => id.to_owned(),
            None => panic!("registration failed: {body}"),
        }
    }

    /// Log in as `username`, returning the bearer token.
    pub async fn login(
        app: &impl Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
        username: &str,
    ) -> String {
        let request = actix_test::TestRequest::post()
            .uri("/auth/login")
            .set_form([
                ("username", format!("{username}@example.com")),
                ("password", TEST_PASSWORD.to_owned()),
            ])
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(app, request).await;
        match body.get("access_token").and_then(Value::as_str) {
            Some(token) => token.to_owned(),
            None => panic!("login failed: {body}"),
        }
    }

    /// Register and log in, returning `(user_id, bearer_token)`.
    pub async fn sign_up(
        app: &impl Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
        username: &str,
    ) -> (String, String) {
        let id = register(app, username).await;
        let token = login(app, username).await;
        (id, token)
    }

    /// Grant the admin role directly in the store.
    pub async fn promote(store: &MemoryStore, user_id: &str) {
        let id = match UserId::new(user_id) {
            Ok(id) => id,
            Err(err) => panic!("invalid user id: {err}"),
        };
        match store.set_role(&id, Role::Admin).await {
            Ok(true) => {}
            other => panic!("promotion failed: {other:?}"),
        }
    }

    /// `Authorization` header value for `token`.
    pub fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
        (
            actix_web::http::header::AUTHORIZATION,
            format!("Bearer {token}"),
        )
    }
}

pub mod openapi {
    //! OpenAPI schema traversal helpers.

    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::{Object, Schema};

    /// Extract an `Object` schema, panicking with a diagnostic if not an Object.
    pub fn unwrap_object_schema<'a>(schema: &'a RefOr<Schema>, name: &str) -> &'a Object {
        match schema {
            RefOr::T(Schema::Object(obj)) => obj,
            RefOr::Ref(reference) => {
                panic!(
                    "schema '{name}' is a $ref to '{}'; resolve the reference first",
                    reference.ref_location
                );
            }
            _ => panic!("schema '{name}' is not an Object"),
        }
    }
}

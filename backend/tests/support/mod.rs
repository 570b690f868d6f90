//! Shared helper utilities for backend integration tests.
//!
//! Integration tests compile as separate crates under `backend/tests/`, so
//! request plumbing shared between suites lives here.

use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test::{self as actix_test, TestRequest};
use ideaboard::test_support::app::bearer;
use serde_json::Value;

/// Send `request` and decode the JSON body, or `Value::Null` when empty.
pub async fn send(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    request: TestRequest,
) -> (StatusCode, Value) {
    let response = actix_test::call_service(app, request.to_request()).await;
    let status = response.status();
    let bytes = actix_test::read_body(response).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body is JSON")
    };
    (status, body)
}

/// `request` carrying `token` as a bearer credential.
pub fn authorised(request: TestRequest, token: &str) -> TestRequest {
    request.insert_header(bearer(token))
}

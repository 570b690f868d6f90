//! Tests for users API handlers.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use rstest::rstest;
use serde_json::{Value, json};

use crate::test_support::app::{
    bearer, memory_state, memory_state_with_store, promote, sign_up, test_app,
};
use crate::test_support::clock::MutableClock;

fn clock() -> Arc<MutableClock> {
    Arc::new(MutableClock::fixed())
}

#[actix_web::test]
async fn current_user_omits_the_password_hash() {
    let app = actix_test::init_service(test_app(memory_state(clock()))).await;
    let (id, token) = sign_up(&app, "mara").await;

    let request = actix_test::TestRequest::get()
        .uri("/users/me")
        .insert_header(bearer(&token))
        .to_request();
    let value: Value = actix_test::call_and_read_body_json(&app, request).await;

    assert_eq!(value["id"], id.as_str());
    assert_eq!(value["username"], "mara");
    assert_eq!(value["role"], "user");
    assert_eq!(value["followers"], json!([]));
    assert!(value.get("password_hash").is_none());
    assert!(value.get("password").is_none());
}

#[actix_web::test]
async fn current_user_requires_a_token() {
    let app = actix_test::init_service(test_app(memory_state(clock()))).await;
    let request = actix_test::TestRequest::get().uri("/users/me").to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(value["message"], "login required");
}

#[rstest]
#[case("/users/me")]
#[case("/users/updateMe")]
#[actix_web::test]
async fn update_current_user_applies_supplied_fields(#[case] uri: &str) {
    let app = actix_test::init_service(test_app(memory_state(clock()))).await;
    let (_, token) = sign_up(&app, "mara").await;

    let request = actix_test::TestRequest::patch()
        .uri(uri)
        .insert_header(bearer(&token))
        .set_json(json!({ "title": "Engineer", "skills": ["rust", "sql"] }))
        .to_request();
    let value: Value = actix_test::call_and_read_body_json(&app, request).await;

    assert_eq!(value["title"], "Engineer");
    assert_eq!(value["skills"], json!(["rust", "sql"]));
    assert_eq!(value["username"], "mara");
}

#[rstest]
#[case(json!({}), StatusCode::BAD_REQUEST)]
#[case(json!({ "username": "ab" }), StatusCode::BAD_REQUEST)]
#[case(json!({ "password": "short" }), StatusCode::BAD_REQUEST)]
#[case(json!({ "username": "ivan" }), StatusCode::CONFLICT)]
#[case(json!({ "email": "IVAN@example.com" }), StatusCode::CONFLICT)]
#[actix_web::test]
async fn update_current_user_rejects_bad_patches(
    #[case] body: Value,
    #[case] status: StatusCode,
) {
    let app = actix_test::init_service(test_app(memory_state(clock()))).await;
    let (_, token) = sign_up(&app, "mara").await;
    sign_up(&app, "ivan").await;

    let request = actix_test::TestRequest::patch()
        .uri("/users/me")
        .insert_header(bearer(&token))
        .set_json(body)
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), status);
}

#[actix_web::test]
async fn list_users_is_not_found_until_someone_registers() {
    let app = actix_test::init_service(test_app(memory_state(clock()))).await;
    let request = actix_test::TestRequest::get().uri("/users/").to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    sign_up(&app, "mara").await;
    let request = actix_test::TestRequest::get().uri("/users/").to_request();
    let value: Value = actix_test::call_and_read_body_json(&app, request).await;
    let users = value.as_array().expect("array of users");
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["username"], "mara");
}

#[actix_web::test]
async fn create_user_returns_created() {
    let app = actix_test::init_service(test_app(memory_state(clock()))).await;
    let request = actix_test::TestRequest::post()
        .uri("/users/")
        .set_json(json!({
            "username": "mara",
            "email": "mara@example.com",
            "password": "hunter22",
            "location": "Novi Sad",
        }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(value["location"], "Novi Sad");
    assert_eq!(value["role"], "user");
}

#[actix_web::test]
async fn create_user_with_taken_email_is_a_conflict() {
    let app = actix_test::init_service(test_app(memory_state(clock()))).await;
    sign_up(&app, "mara").await;

    let request = actix_test::TestRequest::post()
        .uri("/users/")
        .set_json(json!({
            "username": "mara2",
            "email": "mara@example.com",
            "password": "hunter22",
        }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(value["details"]["code"], "email_taken");
}

#[rstest]
#[case("not-a-uuid", StatusCode::BAD_REQUEST)]
#[case("3fa85f64-5717-4562-b3fc-2c963f66afa6", StatusCode::NOT_FOUND)]
#[actix_web::test]
async fn get_user_validates_the_id(#[case] id: &str, #[case] status: StatusCode) {
    let app = actix_test::init_service(test_app(memory_state(clock()))).await;
    let request = actix_test::TestRequest::get()
        .uri(&format!("/users/{id}"))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), status);
}

#[actix_web::test]
async fn delete_user_allows_self_but_not_others() {
    let app = actix_test::init_service(test_app(memory_state(clock()))).await;
    let (mara_id, mara_token) = sign_up(&app, "mara").await;
    let (ivan_id, _) = sign_up(&app, "ivan").await;

    let request = actix_test::TestRequest::delete()
        .uri(&format!("/users/{ivan_id}"))
        .insert_header(bearer(&mara_token))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let request = actix_test::TestRequest::delete()
        .uri(&format!("/users/{mara_id}"))
        .insert_header(bearer(&mara_token))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let request = actix_test::TestRequest::get()
        .uri("/users/me")
        .insert_header(bearer(&mara_token))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn delete_by_username_is_admin_only_and_matches_fragments() {
    let (state, store) = memory_state_with_store(clock());
    let app = actix_test::init_service(test_app(state)).await;
    let (admin_id, admin_token) = sign_up(&app, "root").await;
    let (_, mara_token) = sign_up(&app, "mara").await;
    sign_up(&app, "Marko").await;
    sign_up(&app, "ivan").await;

    let request = actix_test::TestRequest::delete()
        .uri("/users/delete_by_username/?username=mar")
        .insert_header(bearer(&mara_token))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    promote(&store, &admin_id).await;
    let request = actix_test::TestRequest::delete()
        .uri("/users/delete_by_username/?username=ma")
        .insert_header(bearer(&admin_token))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let request = actix_test::TestRequest::delete()
        .uri("/users/delete_by_username/?username=MAR")
        .insert_header(bearer(&admin_token))
        .to_request();
    let value: Value = actix_test::call_and_read_body_json(&app, request).await;
    assert_eq!(value["deleted"], 2);

    let request = actix_test::TestRequest::delete()
        .uri("/users/delete_by_username/?username=mar")
        .insert_header(bearer(&admin_token))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn delete_by_username_requires_the_fragment() {
    let (state, store) = memory_state_with_store(clock());
    let app = actix_test::init_service(test_app(state)).await;
    let (admin_id, admin_token) = sign_up(&app, "root").await;
    promote(&store, &admin_id).await;

    let request = actix_test::TestRequest::delete()
        .uri("/users/delete_by_username/")
        .insert_header(bearer(&admin_token))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(value["details"]["code"], "missing_field");
}

async fn usernames_at(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
    uri: &str,
) -> Value {
    let request = actix_test::TestRequest::get().uri(uri).to_request();
    actix_test::call_and_read_body_json(app, request).await
}

#[actix_web::test]
async fn follow_edges_are_visible_from_both_sides() {
    let app = actix_test::init_service(test_app(memory_state(clock()))).await;
    let (_, mara_token) = sign_up(&app, "mara").await;
    sign_up(&app, "ivan").await;

    let request = actix_test::TestRequest::post()
        .uri("/users/follow/ivan")
        .insert_header(bearer(&mara_token))
        .to_request();
    let value: Value = actix_test::call_and_read_body_json(&app, request).await;
    assert_eq!(value["message"], "you are now following ivan");

    assert_eq!(usernames_at(&app, "/users/followers/ivan").await, json!(["mara"]));
    assert_eq!(usernames_at(&app, "/users/following/mara").await, json!(["ivan"]));
    assert_eq!(usernames_at(&app, "/users/followers/mara").await, json!([]));

    let request = actix_test::TestRequest::post()
        .uri("/users/unfollow/ivan")
        .insert_header(bearer(&mara_token))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(usernames_at(&app, "/users/followers/ivan").await, json!([]));
    assert_eq!(usernames_at(&app, "/users/following/mara").await, json!([]));
}

#[rstest]
#[case("/users/follow/mara", StatusCode::BAD_REQUEST)]
#[case("/users/follow/nobody", StatusCode::NOT_FOUND)]
#[case("/users/unfollow/ivan", StatusCode::BAD_REQUEST)]
#[case("/users/unfollow/mara", StatusCode::BAD_REQUEST)]
#[actix_web::test]
async fn follow_rejects_invalid_edges(#[case] uri: &str, #[case] status: StatusCode) {
    let app = actix_test::init_service(test_app(memory_state(clock()))).await;
    let (_, mara_token) = sign_up(&app, "mara").await;
    sign_up(&app, "ivan").await;

    let request = actix_test::TestRequest::post()
        .uri(uri)
        .insert_header(bearer(&mara_token))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), status);
}

#[actix_web::test]
async fn following_twice_is_rejected() {
    let app = actix_test::init_service(test_app(memory_state(clock()))).await;
    let (_, mara_token) = sign_up(&app, "mara").await;
    sign_up(&app, "ivan").await;

    for expected in [StatusCode::OK, StatusCode::BAD_REQUEST] {
        let request = actix_test::TestRequest::post()
            .uri("/users/follow/ivan")
            .insert_header(bearer(&mara_token))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), expected);
    }
    assert_eq!(usernames_at(&app, "/users/followers/ivan").await, json!(["mara"]));
}

#[actix_web::test]
async fn followers_of_unknown_users_are_not_found() {
    let app = actix_test::init_service(test_app(memory_state(clock()))).await;
    let request = actix_test::TestRequest::get()
        .uri("/users/followers/nobody")
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn user_info_lists_ideas_and_edges() {
    let app = actix_test::init_service(test_app(memory_state(clock()))).await;
    let (_, mara_token) = sign_up(&app, "mara").await;
    let (_, ivan_token) = sign_up(&app, "ivan").await;

    let request = actix_test::TestRequest::post()
        .uri("/ideas/")
        .insert_header(bearer(&mara_token))
        .set_json(json!({
            "title": "Compost bins",
            "description": "Shared compost for the block",
            "market": "Households",
            "target_audience": "Tenants",
        }))
        .to_request();
    let idea: Value = actix_test::call_and_read_body_json(&app, request).await;

    let request = actix_test::TestRequest::post()
        .uri("/users/follow/mara")
        .insert_header(bearer(&ivan_token))
        .to_request();
    actix_test::call_service(&app, request).await;

    let request = actix_test::TestRequest::get()
        .uri("/users/user-info/by-username/mara")
        .to_request();
    let value: Value = actix_test::call_and_read_body_json(&app, request).await;

    assert_eq!(value["username"], "mara");
    assert_eq!(value["email"], "mara@example.com");
    assert_eq!(
        value["ideas"],
        json!([{ "id": idea["id"].clone(), "title": "Compost bins" }])
    );
    assert_eq!(value["followers"], json!(["ivan"]));
    assert_eq!(value["following"], json!([]));
}

#[actix_web::test]
async fn ideas_by_popular_creators_is_empty_without_ideas() {
    let app = actix_test::init_service(test_app(memory_state(clock()))).await;
    sign_up(&app, "mara").await;
    let request = actix_test::TestRequest::get()
        .uri("/users/ideas/by-popular-creators")
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(value, json!([]));
}

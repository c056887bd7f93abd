//! Router-level tests for the `user.*` procedures
//!
//! Runs the full middleware stack against an in-memory user store.

use crate::auth::JwtService;
use crate::config::AppConfig;
use crate::repositories::InMemoryUserStore;
use crate::routes::create_router;
use crate::state::AppState;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use proptest::prelude::*;
use rstest::rstest;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn test_state() -> AppState {
    AppState::with_store(Arc::new(InMemoryUserStore::new()), AppConfig::default()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

async fn post_json(app: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn get(app: &Router, path: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(path)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

fn sign_up_body(username: &str, email: &str) -> Value {
    json!({
        "username": username,
        "email": email,
        "password": "correct horse",
        "passwordConfirmation": "correct horse"
    })
}

/// Generate random invalid tokens
fn invalid_token_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        // Empty token
        Just("".to_string()),
        // Random string (not a valid JWT)
        "[a-zA-Z0-9]{10,50}",
        // Malformed JWT (wrong number of parts)
        "[a-zA-Z0-9]{10}\\.[a-zA-Z0-9]{10}",
        // Valid format but invalid signature
        "[a-zA-Z0-9_-]{20}\\.[a-zA-Z0-9_-]{20}\\.[a-zA-Z0-9_-]{20}",
    ]
}

/// Generate random authorization header formats
fn auth_header_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        // No header
        Just(None),
        // Missing Bearer prefix
        invalid_token_strategy().prop_map(Some),
        // Wrong prefix
        invalid_token_strategy().prop_map(|t| Some(format!("Basic {}", t))),
        // Bearer with invalid token
        invalid_token_strategy().prop_map(|t| Some(format!("Bearer {}", t))),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Anything short of a token signed with our secret is rejected
    #[test]
    fn prop_unauthenticated_requests_return_401(
        auth_header in auth_header_strategy()
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let app = create_router(test_state());

            let mut request_builder = Request::builder()
                .uri("/api/v1/user.me")
                .method("GET");

            if let Some(header) = auth_header {
                request_builder = request_builder.header("Authorization", header);
            }

            let request = request_builder.body(Body::empty()).unwrap();
            let (status, body) = send(&app, request).await;

            prop_assert_eq!(status, StatusCode::UNAUTHORIZED);
            prop_assert_eq!(&body["error"]["code"], "UNAUTHORIZED");

            Ok(())
        })?;
    }
}

#[tokio::test]
async fn test_api_root() {
    let app = create_router(test_state());
    let request = Request::builder()
        .uri("/api/v1/")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_sign_up_returns_user_and_token() {
    let app = create_router(test_state());

    let (status, body) = post_json(
        &app,
        "/api/v1/user.signUp",
        sign_up_body("ada", "Ada@Example.COM"),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "ada");
    assert_eq!(body["email"], "ada@example.com");
    assert!(body["id"].is_string());
    assert!(body["createdAt"].is_string());
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["expiresIn"], 3600);
    assert!(body.get("passwordHash").is_none());
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_sign_up_token_authenticates_me() {
    let app = create_router(test_state());

    let (_, created) = post_json(
        &app,
        "/api/v1/user.signUp",
        sign_up_body("grace", "grace@example.com"),
    )
    .await;
    let token = created["token"].as_str().unwrap();

    let request = Request::builder()
        .uri("/api/v1/user.me")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], created["id"]);
    assert_eq!(body["username"], "grace");
}

#[tokio::test]
async fn test_sign_up_validation_errors_are_per_field() {
    let app = create_router(test_state());

    let (status, body) = post_json(
        &app,
        "/api/v1/user.signUp",
        json!({
            "username": "a",
            "email": "not-an-email",
            "password": "short",
            "passwordConfirmation": "different"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    let fields = &body["error"]["fieldErrors"];
    assert_eq!(fields["username"][0], "Username is too short");
    assert_eq!(fields["password"][0], "Password is too short");
    assert!(fields["email"].is_array());
    assert!(fields["passwordConfirmation"].is_array());
}

/// A valid address whose length is `197 + last_label`
fn long_email(last_label: usize) -> String {
    format!(
        "{}@{}.{}.{}.com",
        "a".repeat(64),
        "b".repeat(63),
        "c".repeat(63),
        "d".repeat(last_label)
    )
}

#[rstest]
#[case::plain("ann", "ann@x.com".to_string(), StatusCode::CREATED)]
#[case::longest_email("ann", long_email(58), StatusCode::CREATED)]
#[case::email_past_column_width("ann", long_email(59), StatusCode::BAD_REQUEST)]
#[case::short_username("a", "ann@x.com".to_string(), StatusCode::BAD_REQUEST)]
#[case::long_username(&"u".repeat(51), "ann@x.com".to_string(), StatusCode::BAD_REQUEST)]
#[tokio::test]
async fn test_sign_up_status(
    #[case] username: &str,
    #[case] email: String,
    #[case] expected: StatusCode,
) {
    let app = create_router(test_state());
    let (status, _) = post_json(&app, "/api/v1/user.signUp", sign_up_body(username, &email)).await;
    assert_eq!(status, expected);
}

#[tokio::test]
async fn test_longest_email_signs_in() {
    let app = create_router(test_state());
    let email = long_email(58);

    let (status, _) = post_json(&app, "/api/v1/user.signUp", sign_up_body("ann", &email)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post_json(
        &app,
        "/api/v1/user.signIn",
        json!({ "login": email, "password": "correct horse" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "ann");
}

#[tokio::test]
async fn test_sign_up_duplicate_returns_conflict() {
    let app = create_router(test_state());

    let (status, _) = post_json(
        &app,
        "/api/v1/user.signUp",
        sign_up_body("linus", "linus@example.com"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post_json(
        &app,
        "/api/v1/user.signUp",
        sign_up_body("linus", "LINUS@example.com"),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
    assert_eq!(
        body["error"]["fieldErrors"]["username"][0],
        "Username is already taken"
    );
    assert_eq!(
        body["error"]["fieldErrors"]["email"][0],
        "Email is already registered"
    );
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = create_router(test_state());

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/user.signUp")
        .header("Content-Type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_sign_in_by_username_and_email() {
    let app = create_router(test_state());
    post_json(
        &app,
        "/api/v1/user.signUp",
        sign_up_body("margaret", "margaret@example.com"),
    )
    .await;

    for login in ["margaret", "Margaret@Example.com"] {
        let (status, body) = post_json(
            &app,
            "/api/v1/user.signIn",
            json!({ "login": login, "password": "correct horse" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK, "login {login}");
        assert_eq!(body["username"], "margaret");
        assert!(body["token"].is_string());
    }
}

#[tokio::test]
async fn test_sign_in_failures_are_indistinguishable() {
    let app = create_router(test_state());
    post_json(
        &app,
        "/api/v1/user.signUp",
        sign_up_body("barbara", "barbara@example.com"),
    )
    .await;

    let (wrong_status, wrong_body) = post_json(
        &app,
        "/api/v1/user.signIn",
        json!({ "login": "barbara", "password": "wrong password" }),
    )
    .await;
    let (unknown_status, unknown_body) = post_json(
        &app,
        "/api/v1/user.signIn",
        json!({ "login": "nobody", "password": "correct horse" }),
    )
    .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
    assert_eq!(wrong_body["error"]["message"], "Invalid login or password");
}

#[tokio::test]
async fn test_sign_in_validation_error() {
    let app = create_router(test_state());

    let (status, body) = post_json(
        &app,
        "/api/v1/user.signIn",
        json!({ "login": "x", "password": "" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["fieldErrors"]["login"].is_array());
    assert!(body["error"]["fieldErrors"]["password"].is_array());
}

#[tokio::test]
async fn test_check_unique_reports_taken_fields() {
    let app = create_router(test_state());
    post_json(
        &app,
        "/api/v1/user.signUp",
        sign_up_body("alan", "alan@example.com"),
    )
    .await;

    let (status, body) = get(&app, "/api/v1/user.checkUnique?username=alan").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "username": true }));

    let (_, body) = get(&app, "/api/v1/user.checkUnique?email=ALAN%40example.com").await;
    assert_eq!(body, json!({ "email": true }));

    let (_, body) = get(
        &app,
        "/api/v1/user.checkUnique?username=someone&email=someone%40example.com",
    )
    .await;
    assert_eq!(body, json!({ "username": false, "email": false }));
}

#[tokio::test]
async fn test_check_unique_without_params() {
    let app = create_router(test_state());

    let (status, body) = get(&app, "/api/v1/user.checkUnique?username=&email=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "username": false, "email": false }));
}

#[tokio::test]
async fn test_token_with_wrong_secret_returns_401() {
    let app = create_router(test_state());

    let other = JwtService::new("wrong-secret-key", 3600).unwrap();
    let token = other.sign(uuid::Uuid::new_v4()).unwrap();

    let request = Request::builder()
        .uri("/api/v1/user.me")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_valid_token_for_missing_user_is_not_found() {
    let state = test_state();
    let token = state.jwt().sign(uuid::Uuid::new_v4()).unwrap();
    let app = create_router(state);

    let request = Request::builder()
        .uri("/api/v1/user.me")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_metrics_disabled_returns_404() {
    let app = create_router(test_state());
    let (status, _) = get(&app, "/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_readiness_with_in_memory_store() {
    let app = create_router(test_state());
    let (status, body) = get(&app, "/health/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

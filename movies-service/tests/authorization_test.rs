mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use chrono::{Duration, Utc};
use common::{admin, user, TestApp};
use movies_service::services::{AuthoritySet, TokenCodec};

#[tokio::test]
async fn test_protected_endpoint_requires_token() {
    let app = TestApp::new();

    let response = app.call(Method::GET, "/users", None, None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json()["error"], "Authentication required");
}

#[tokio::test]
async fn test_public_endpoints_work_without_token() {
    let app = TestApp::new();

    let response = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["status"], "healthy");
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let app = TestApp::new();

    let response = app
        .call(Method::GET, "/users", Some("definitely.not.valid"), None)
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json()["code"], "invalid_token");
}

#[tokio::test]
async fn test_token_from_foreign_secret_is_rejected() {
    let app = TestApp::new();
    app.seed_user("root@example.com", &admin()).await;

    let foreign = TokenCodec::new(
        b"some-other-deployment-secret-0123456789abcdef",
        Duration::minutes(60),
    )
    .unwrap();
    let token = foreign
        .issue(
            "root@example.com",
            &admin().into_iter().collect::<AuthoritySet>(),
            Utc::now(),
        )
        .unwrap()
        .token;

    let response = app.call(Method::GET, "/users", Some(&token), None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json()["code"], "invalid_token");
}

#[tokio::test]
async fn test_expired_token_gets_distinct_status() {
    let app = TestApp::new();
    app.seed_user("ana@example.com", &user()).await;

    let token = app.token_issued_at(
        "ana@example.com",
        &user(),
        Utc::now() - Duration::minutes(61),
    );
    let response = app.call(Method::GET, "/users", Some(&token), None).await;

    assert_eq!(response.status.as_u16(), 419);
    assert_eq!(response.json()["code"], "token_expired");
}

#[tokio::test]
async fn test_bad_token_is_rejected_before_the_handler() {
    let app = TestApp::new();

    // Even a public route refuses a request carrying a forged credential.
    let response = app
        .call(Method::GET, "/health", Some("forged.token.value"), None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_bearer_scheme_is_treated_as_anonymous() {
    let app = TestApp::new();

    let response = app
        .send(
            Request::builder()
                .uri("/users")
                .header(header::AUTHORIZATION, "Basic YW5hOnNlY3JldA==")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json()["error"], "Authentication required");
}

#[tokio::test]
async fn test_admin_token_satisfies_user_endpoints_through_hierarchy() {
    let app = TestApp::new();
    app.seed_user("root@example.com", &admin()).await;

    let token = app.token_for("root@example.com", &admin());
    let response = app.call(Method::GET, "/users", Some(&token), None).await;

    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_token_without_user_authority_is_forbidden() {
    let app = TestApp::new();
    app.seed_user("guest@example.com", &[]).await;

    let token = app.token_for("guest@example.com", &[]);
    let response = app.call(Method::GET, "/users", Some(&token), None).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    let app = TestApp::new();

    let response = app
        .send(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.header("x-request-id"), Some("req-123"));
    assert_eq!(response.header("x-content-type-options"), Some("nosniff"));
}

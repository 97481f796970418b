mod common;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Method, Request, StatusCode},
};
use chrono::Utc;
use common::{admin, user, TestApp};
use movies_service::services::{Authority, AuthoritySet};
use serde_json::json;
use std::net::SocketAddr;

/// Failed login from `peer`, optionally claiming to forward for `forwarded_for`.
fn login_attempt(peer: [u8; 4], forwarded_for: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(ip) = forwarded_for {
        builder = builder.header("x-forwarded-for", ip);
    }
    let mut request = builder
        .body(Body::from(
            json!({ "email": "nobody@example.com", "password": "guess" }).to_string(),
        ))
        .unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((peer, 51000))));
    request
}

#[tokio::test]
async fn test_login_returns_token_in_authentication_header() {
    let app = TestApp::new();
    app.seed_user_with_password("ana@example.com", "correct horse", &admin())
        .await;

    let response = app.login("ana@example.com", "correct horse").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.is_empty());

    let value = response
        .header("authentication")
        .expect("Authentication header missing");
    let token = value.strip_prefix("Bearer ").expect("Bearer scheme");

    let verified = app.tokens.decode(token, Utc::now()).unwrap();
    assert_eq!(verified.subject, "ana@example.com");
    // Tokens carry the stored roles, not the expanded set.
    assert_eq!(verified.authorities, AuthoritySet::from([Authority::admin()]));
}

#[tokio::test]
async fn test_issued_token_authenticates_later_requests() {
    let app = TestApp::new();
    app.seed_user_with_password("ana@example.com", "correct horse", &user())
        .await;

    let response = app.login("ana@example.com", "correct horse").await;
    let token = response
        .header("authentication")
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap()
        .to_string();

    let response = app
        .call(Method::GET, "/users/ana@example.com", Some(&token), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["email"], "ana@example.com");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::new();
    app.seed_user_with_password("ana@example.com", "correct horse", &user())
        .await;

    let wrong_password = app.login("ana@example.com", "battery staple").await;
    let unknown_user = app.login("nobody@example.com", "correct horse").await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_user.body);
    assert_eq!(wrong_password.json(), json!({ "error": "Invalid credentials" }));
    assert!(wrong_password.header("authentication").is_none());
    assert!(unknown_user.header("authentication").is_none());
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = TestApp::new();

    let response = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"email\": "))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_fields_fail_validation() {
    let app = TestApp::new();

    let response = app
        .call(
            Method::POST,
            "/login",
            None,
            Some(json!({ "email": "not-an-email", "password": "x" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .call(
            Method::POST,
            "/login",
            None,
            Some(json!({ "email": "ana@example.com", "password": "" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_login_is_rate_limited_per_ip() {
    let mut config = movies_service::config::MoviesConfig::default();
    config.rate_limit.login_attempts = 2;
    let app = TestApp::with_config(config);

    for _ in 0..2 {
        let response = app.send(login_attempt([203, 0, 113, 7], None)).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    let response = app.send(login_attempt([203, 0, 113, 7], None)).await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(response.header("retry-after").is_some());

    let response = app.send(login_attempt([203, 0, 113, 8], None)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_spoofed_forwarded_for_does_not_evade_login_limit() {
    let mut config = movies_service::config::MoviesConfig::default();
    config.rate_limit.login_attempts = 2;
    let app = TestApp::with_config(config);

    let mut limited = 0;
    for i in 0..20 {
        let spoofed = format!("10.0.0.{}", i);
        let response = app
            .send(login_attempt([198, 51, 100, 4], Some(&spoofed)))
            .await;
        if response.status == StatusCode::TOO_MANY_REQUESTS {
            limited += 1;
        } else {
            assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        }
    }
    assert_eq!(limited, 18);
}

#[tokio::test]
async fn test_trusted_proxy_limits_per_forwarded_client() {
    let mut config = movies_service::config::MoviesConfig::default();
    config.rate_limit.login_attempts = 1;
    config.rate_limit.trust_forwarded_for = true;
    let app = TestApp::with_config(config);

    let proxy = [192, 0, 2, 10];
    let response = app.send(login_attempt(proxy, Some("203.0.113.7"))).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app.send(login_attempt(proxy, Some("203.0.113.7"))).await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);

    let response = app.send(login_attempt(proxy, Some("203.0.113.8"))).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_authentication_header_is_exposed_to_browsers() {
    let app = TestApp::new();
    app.seed_user_with_password("ana@example.com", "correct horse", &user())
        .await;

    let response = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/login")
                .header(header::ORIGIN, "http://localhost:3000")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "email": "ana@example.com", "password": "correct horse" })
                        .to_string(),
                ))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let exposed = response
        .header("access-control-expose-headers")
        .unwrap()
        .to_ascii_lowercase();
    assert!(exposed.contains("authentication"));
}

//! Test helper module for movies-service integration tests.
//!
//! Builds the full router over an `InMemoryStore`, so no MongoDB is needed.

#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use movies_service::{
    build_router,
    config::MoviesConfig,
    models::{Comment, Movie, User},
    services::{
        store::{CommentRepository, MovieRepository, UserRepository},
        Authority, AuthoritySet, InMemoryStore, TokenCodec,
    },
    utils::{hash_password, Password},
    AppState,
};
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;

pub const TEST_SECRET: &[u8] = b"integration-test-secret-0123456789abcdefghij";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub tokens: TokenCodec,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(MoviesConfig::default())
    }

    pub fn with_config(mut config: MoviesConfig) -> Self {
        config.log_level = "error".to_string();
        let tokens = TokenCodec::new(
            TEST_SECRET,
            chrono::Duration::minutes(config.jwt.expiry_minutes),
        )
        .expect("Failed to create token codec");
        let store = Arc::new(InMemoryStore::new());

        let state = AppState::new(config, tokens.clone(), store.clone())
            .expect("Failed to build app state");
        let router = build_router(state).expect("Failed to build router");

        Self {
            router,
            store,
            tokens,
        }
    }

    /// Seed a user whose password can never match; for tests that mint tokens directly.
    pub async fn seed_user(&self, email: &str, roles: &[Authority]) {
        self.insert(email, "!".to_string(), roles).await;
    }

    pub async fn seed_user_with_password(&self, email: &str, password: &str, roles: &[Authority]) {
        let hash = hash_password(&Password::new(password.to_string()))
            .expect("Failed to hash password");
        self.insert(email, hash.into_string(), roles).await;
    }

    async fn insert(&self, email: &str, hash: String, roles: &[Authority]) {
        let mut user = User::new(email.to_string(), "Test User".to_string(), hash);
        user.roles = roles.to_vec();
        self.store.insert_user(&user).await.expect("Failed to seed user");
    }

    /// Seed a movie under a fixed id.
    pub async fn seed_movie(&self, id: &str, title: &str) -> Movie {
        let mut movie = Movie::new(title.to_string());
        movie.id = id.to_string();
        self.store
            .insert_movie(&movie)
            .await
            .expect("Failed to seed movie");
        movie
    }

    pub async fn seed_comment(&self, author: &str, movie_id: &str, rating: i32) -> Comment {
        let comment = Comment::new(movie_id.to_string(), author.to_string(), rating, None);
        self.store
            .insert_comment(&comment)
            .await
            .expect("Failed to seed comment");
        comment
    }

    pub fn token_for(&self, email: &str, roles: &[Authority]) -> String {
        self.token_issued_at(email, roles, Utc::now())
    }

    pub fn token_issued_at(&self, email: &str, roles: &[Authority], now: DateTime<Utc>) -> String {
        let authorities: AuthoritySet = roles.iter().cloned().collect();
        self.tokens
            .issue(email, &authorities, now)
            .expect("Failed to issue token")
            .token
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).expect("Failed to build request"))
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.call(
            Method::POST,
            "/login",
            None,
            Some(serde_json::json!({ "email": email, "password": password })),
        )
        .await
    }
}

pub fn user() -> Vec<Authority> {
    vec![Authority::user()]
}

pub fn admin() -> Vec<Authority> {
    vec![Authority::admin()]
}

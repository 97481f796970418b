pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use service_core::axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, patch, post},
    Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::MoviesConfig;
use crate::handlers::auth::AUTHENTICATION_HEADER;
use crate::middleware::{authorization_middleware, AuthGate};
use crate::services::store::UserRepository;
use crate::services::{
    CommentService, CredentialVerifier, MovieService, PermissionEvaluator, Store, TokenCodec,
    UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: MoviesConfig,
    pub tokens: TokenCodec,
    pub gate: AuthGate,
    pub credentials: CredentialVerifier,
    pub users: UserService,
    pub movies: MovieService,
    pub comments: CommentService,
    pub db: Arc<dyn UserRepository>,
    pub login_rate_limiter: IpRateLimiter,
}

impl AppState {
    /// Wire every component onto one backing store.
    pub fn new<S: Store + 'static>(
        config: MoviesConfig,
        tokens: TokenCodec,
        store: Arc<S>,
    ) -> Result<Self, AppError> {
        let roles = Arc::new(config.role_hierarchy()?);

        let credentials = CredentialVerifier::new(store.clone()).map_err(AppError::InternalError)?;
        let permissions = PermissionEvaluator::new(roles.clone(), store.clone(), store.clone());
        let users = UserService::new(store.clone(), permissions.clone());
        let movies = MovieService::new(store.clone(), permissions.clone());
        let comments =
            CommentService::new(store.clone(), store.clone(), store.clone(), permissions);
        let login_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.login_attempts,
            config.rate_limit.login_window_seconds,
            config.rate_limit.trust_forwarded_for,
        );

        Ok(Self {
            gate: AuthGate::new(tokens.clone(), roles),
            config,
            tokens,
            credentials,
            users,
            movies,
            comments,
            db: store,
            login_rate_limiter,
        })
    }
}

fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer, AppError> {
    let allow_origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins = allowed_origins
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>().map_err(|e| {
                    AppError::ConfigError(anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([
            HeaderName::from_static(AUTHENTICATION_HEADER),
            header::AUTHORIZATION,
        ]))
}

pub fn build_router(state: AppState) -> Result<Router, AppError> {
    let login_limiter = state.login_rate_limiter.clone();
    let login_route = Router::new()
        .route("/login", post(handlers::auth::login))
        .layer(from_fn_with_state(login_limiter, ip_rate_limit_middleware));

    let cors = cors_layer(&state.config.security.allowed_origins)?;

    let app = Router::new()
        .route("/health", get(health_check))
        .merge(login_route)
        .route(
            "/users",
            get(handlers::user::list_users).post(handlers::user::register),
        )
        .route(
            "/users/:id",
            get(handlers::user::get_user)
                .patch(handlers::user::update_user)
                .delete(handlers::user::delete_user),
        )
        .route("/users/:id/friends", post(handlers::user::add_friend))
        .route(
            "/users/:id/friends/:friend_id",
            delete(handlers::user::remove_friend),
        )
        .route(
            "/users/:id/comments",
            get(handlers::user::list_user_comments),
        )
        .route(
            "/movies",
            get(handlers::movie::list_movies).post(handlers::movie::create_movie),
        )
        .route(
            "/movies/:id",
            get(handlers::movie::get_movie)
                .patch(handlers::movie::update_movie)
                .delete(handlers::movie::delete_movie),
        )
        .route(
            "/movies/:id/comments",
            get(handlers::comment::list_movie_comments),
        )
        .route("/comments", post(handlers::comment::create_comment))
        .route(
            "/comments/:id",
            patch(handlers::comment::update_comment).delete(handlers::comment::delete_comment),
        )
        .with_state(state.clone())
        .layer(from_fn_with_state(
            state.gate.clone(),
            authorization_middleware,
        ))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                    subject = tracing::field::Empty,
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors);

    Ok(app)
}

/// Service health check
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.db.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "MongoDB health check failed");
        AppError::ServiceUnavailable
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "mongodb": "up"
        }
    })))
}

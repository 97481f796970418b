use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use std::sync::Arc;

use crate::services::roles::{AuthoritySet, RoleHierarchy};
use crate::services::token::{TokenCodec, TokenError};

const BEARER_PREFIX: &str = "Bearer ";

/// Verified identity of the caller for the rest of the request.
///
/// `authorities` is already expanded through the role hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub subject: String,
    pub authorities: AuthoritySet,
}

/// Token validation shared by every request.
#[derive(Clone)]
pub struct AuthGate {
    tokens: TokenCodec,
    roles: Arc<RoleHierarchy>,
}

impl AuthGate {
    pub fn new(tokens: TokenCodec, roles: Arc<RoleHierarchy>) -> Self {
        Self { tokens, roles }
    }

    pub fn authenticate(&self, raw: &str, now: DateTime<Utc>) -> Result<Caller, TokenError> {
        let verified = self.tokens.decode(raw, now)?;
        Ok(Caller {
            subject: verified.subject,
            authorities: self.roles.expand(&verified.authorities),
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
}

/// Runs once per request ahead of every handler.
///
/// No bearer credential: the request continues unauthenticated and handlers
/// that take a [`Caller`] reject it. Invalid or foreign tokens get 401,
/// expired ones 419, and neither reaches the handler.
pub async fn authorization_middleware(
    State(gate): State<AuthGate>,
    mut req: Request,
    next: Next,
) -> Response {
    if req.extensions().get::<Caller>().is_some() {
        return next.run(req).await;
    }

    let Some(raw) = bearer_token(req.headers()) else {
        return next.run(req).await;
    };

    match gate.authenticate(raw, Utc::now()) {
        Ok(caller) => {
            tracing::Span::current().record("subject", caller.subject.as_str());
            tracing::debug!(subject = %caller.subject, "Bearer token accepted");
            req.extensions_mut().insert(caller);
            next.run(req).await
        }
        Err(TokenError::Expired) => {
            tracing::info!("Rejected expired bearer token");
            AppError::TokenExpired.into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Rejected bearer token");
            AppError::InvalidToken.into_response()
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Authentication required")))
    }
}

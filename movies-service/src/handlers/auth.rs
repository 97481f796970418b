//! Login endpoint.
//!
//! Exchanges an email/password pair for a signed session token returned in
//! the `Authentication` response header.

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use service_core::error::AppError;

use crate::dtos::auth::LoginRequest;
use crate::services::ServiceError;
use crate::utils::ValidatedJson;
use crate::AppState;

pub const AUTHENTICATION_HEADER: &str = "authentication";

#[tracing::instrument(skip(state, req), fields(email = %req.email))]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Response, AppError> {
    let (email, password) = req.into_parts();

    let authorities = match state.credentials.verify(&email, &password).await {
        Ok(authorities) => authorities,
        Err(e @ (ServiceError::UnknownIdentity | ServiceError::BadCredential)) => {
            tracing::warn!(reason = %e, "Login failed");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    let issued = state.tokens.issue(&email, &authorities, Utc::now())?;
    let value = HeaderValue::from_str(&format!("Bearer {}", issued.token))
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Invalid token header: {}", e)))?;

    tracing::info!(expires_at = %issued.expires_at, "Login succeeded");
    Ok((StatusCode::OK, [(AUTHENTICATION_HEADER, value)]).into_response())
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::dtos::comment::CommentResponse;
use crate::dtos::user::{AddFriendRequest, RegisterRequest, UpdateUserRequest};
use crate::middleware::Caller;
use crate::utils::ValidatedJson;
use crate::AppState;

pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.users.register(req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_users(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.users.list(&caller).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.users.get(&caller, &email).await?))
}

pub async fn update_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(email): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.users.update_profile(&caller, &email, req).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.users.delete(&caller, &email).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_friend(
    State(state): State<AppState>,
    caller: Caller,
    Path(email): Path<String>,
    ValidatedJson(req): ValidatedJson<AddFriendRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.users.add_friend(&caller, &email, &req.email).await?))
}

pub async fn remove_friend(
    State(state): State<AppState>,
    caller: Caller,
    Path((email, friend)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.users.remove_friend(&caller, &email, &friend).await?))
}

/// Comments written by a user. Visible to the user, their friends and admins.
pub async fn list_user_comments(
    State(state): State<AppState>,
    caller: Caller,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let comments = state.comments.list_for_user(&caller, &email).await?;
    Ok(Json(
        comments
            .into_iter()
            .map(CommentResponse::from)
            .collect::<Vec<_>>(),
    ))
}

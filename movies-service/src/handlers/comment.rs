use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::dtos::comment::{CommentResponse, CreateCommentRequest, UpdateCommentRequest};
use crate::middleware::Caller;
use crate::utils::ValidatedJson;
use crate::AppState;

pub async fn list_movie_comments(
    State(state): State<AppState>,
    caller: Caller,
    Path(movie_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let comments = state.comments.list_for_movie(&caller, &movie_id).await?;
    Ok(Json(
        comments
            .into_iter()
            .map(CommentResponse::from)
            .collect::<Vec<_>>(),
    ))
}

pub async fn create_comment(
    State(state): State<AppState>,
    caller: Caller,
    ValidatedJson(req): ValidatedJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let comment = state.comments.create(&caller, req).await?;
    Ok((StatusCode::CREATED, Json(CommentResponse::from(comment))))
}

pub async fn update_comment(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let comment = state.comments.update(&caller, &id, req).await?;
    Ok(Json(CommentResponse::from(comment)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.comments.delete(&caller, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::dtos::movie::{CreateMovieRequest, MovieResponse, UpdateMovieRequest};
use crate::middleware::Caller;
use crate::utils::ValidatedJson;
use crate::AppState;

pub async fn list_movies(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<impl IntoResponse, AppError> {
    let movies = state.movies.list(&caller).await?;
    Ok(Json(
        movies
            .into_iter()
            .map(MovieResponse::from)
            .collect::<Vec<_>>(),
    ))
}

pub async fn get_movie(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let movie = state.movies.get(&caller, &id).await?;
    Ok(Json(MovieResponse::from(movie)))
}

pub async fn create_movie(
    State(state): State<AppState>,
    caller: Caller,
    ValidatedJson(req): ValidatedJson<CreateMovieRequest>,
) -> Result<impl IntoResponse, AppError> {
    let movie = state.movies.create(&caller, req).await?;
    Ok((StatusCode::CREATED, Json(MovieResponse::from(movie))))
}

pub async fn update_movie(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateMovieRequest>,
) -> Result<impl IntoResponse, AppError> {
    let movie = state.movies.update(&caller, &id, req).await?;
    Ok(Json(MovieResponse::from(movie)))
}

pub async fn delete_movie(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.movies.delete(&caller, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

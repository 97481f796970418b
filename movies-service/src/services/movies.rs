use std::sync::Arc;

use crate::dtos::movie::{CreateMovieRequest, UpdateMovieRequest};
use crate::middleware::Caller;
use crate::models::{Movie, ReleaseDate};
use crate::services::error::ServiceError;
use crate::services::permissions::PermissionEvaluator;
use crate::services::store::{MovieRepository, MovieUpdate};

/// The movie catalogue. Anyone signed in reads it; only admins change it.
#[derive(Clone)]
pub struct MovieService {
    movies: Arc<dyn MovieRepository>,
    permissions: PermissionEvaluator,
}

fn check_title(title: &str) -> Result<(), ServiceError> {
    if title.trim().is_empty() {
        return Err(ServiceError::Validation("Title is required".to_string()));
    }
    Ok(())
}

fn check_release_date(date: Option<&ReleaseDate>) -> Result<(), ServiceError> {
    match date {
        Some(date) if !date.is_plausible() => Err(ServiceError::Validation(
            "Release date is out of range".to_string(),
        )),
        _ => Ok(()),
    }
}

impl MovieService {
    pub fn new(movies: Arc<dyn MovieRepository>, permissions: PermissionEvaluator) -> Self {
        Self {
            movies,
            permissions,
        }
    }

    async fn existing(&self, id: &str) -> Result<Movie, ServiceError> {
        self.movies
            .find_movie(id)
            .await?
            .ok_or(ServiceError::NotFound("Movie"))
    }

    pub async fn list(&self, caller: &Caller) -> Result<Vec<Movie>, ServiceError> {
        self.permissions.require_user(caller)?;
        self.movies.list_movies().await
    }

    pub async fn get(&self, caller: &Caller, id: &str) -> Result<Movie, ServiceError> {
        self.permissions.require_user(caller)?;
        self.existing(id).await
    }

    pub async fn create(
        &self,
        caller: &Caller,
        req: CreateMovieRequest,
    ) -> Result<Movie, ServiceError> {
        self.permissions.can_manage_movies(caller).await?;
        check_title(&req.title)?;
        check_release_date(req.release_date.as_ref())?;

        let mut movie = Movie::new(req.title);
        movie.overview = req.overview;
        movie.tagline = req.tagline;
        movie.genres = req.genres;
        movie.keywords = req.keywords;
        movie.release_date = req.release_date;
        movie.runtime = req.runtime;
        movie.budget = req.budget;
        movie.revenue = req.revenue;

        self.movies.insert_movie(&movie).await?;
        tracing::info!(movie_id = %movie.id, created_by = %caller.subject, "Movie created");
        Ok(movie)
    }

    pub async fn update(
        &self,
        caller: &Caller,
        id: &str,
        req: UpdateMovieRequest,
    ) -> Result<Movie, ServiceError> {
        self.existing(id).await?;
        self.permissions.can_manage_movies(caller).await?;

        if req.is_empty() {
            return Err(ServiceError::Validation(
                "At least one field must be provided".to_string(),
            ));
        }
        if let Some(title) = &req.title {
            check_title(title)?;
        }
        check_release_date(req.release_date.as_ref())?;

        let update = MovieUpdate {
            title: req.title,
            overview: req.overview,
            tagline: req.tagline,
            genres: req.genres,
            keywords: req.keywords,
            release_date: req.release_date,
            runtime: req.runtime,
            budget: req.budget,
            revenue: req.revenue,
        };
        self.movies
            .update_movie(id, &update)
            .await?
            .ok_or(ServiceError::NotFound("Movie"))
    }

    /// Deletes the movie together with its comments.
    pub async fn delete(&self, caller: &Caller, id: &str) -> Result<(), ServiceError> {
        self.existing(id).await?;
        self.permissions.can_manage_movies(caller).await?;

        if !self.movies.delete_movie(id).await? {
            return Err(ServiceError::NotFound("Movie"));
        }
        tracing::info!(movie_id = id, deleted_by = %caller.subject, "Movie deleted");
        Ok(())
    }
}

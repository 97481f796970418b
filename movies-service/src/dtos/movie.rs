use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Movie, ReleaseDate};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMovieRequest {
    #[validate(length(min = 1, max = 500, message = "Title is required"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Overview is too long"))]
    pub overview: Option<String>,

    pub tagline: Option<String>,

    #[serde(default)]
    pub genres: Vec<String>,

    #[serde(default)]
    pub keywords: Vec<String>,

    pub release_date: Option<ReleaseDate>,

    #[validate(range(min = 0, message = "Runtime cannot be negative"))]
    pub runtime: Option<i32>,

    #[validate(range(min = 0, message = "Budget cannot be negative"))]
    pub budget: Option<i64>,

    #[validate(range(min = 0, message = "Revenue cannot be negative"))]
    pub revenue: Option<i64>,
}

/// Partial update; absent fields are left as stored.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateMovieRequest {
    #[validate(length(min = 1, max = 500, message = "Title cannot be empty"))]
    pub title: Option<String>,

    #[validate(length(max = 5000, message = "Overview is too long"))]
    pub overview: Option<String>,

    pub tagline: Option<String>,

    pub genres: Option<Vec<String>>,

    pub keywords: Option<Vec<String>>,

    pub release_date: Option<ReleaseDate>,

    #[validate(range(min = 0, message = "Runtime cannot be negative"))]
    pub runtime: Option<i32>,

    #[validate(range(min = 0, message = "Budget cannot be negative"))]
    pub budget: Option<i64>,

    #[validate(range(min = 0, message = "Revenue cannot be negative"))]
    pub revenue: Option<i64>,
}

impl UpdateMovieRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.overview.is_none()
            && self.tagline.is_none()
            && self.genres.is_none()
            && self.keywords.is_none()
            && self.release_date.is_none()
            && self.runtime.is_none()
            && self.budget.is_none()
            && self.revenue.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieResponse {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    pub genres: Vec<String>,
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<ReleaseDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue: Option<i64>,
}

impl From<Movie> for MovieResponse {
    fn from(m: Movie) -> Self {
        Self {
            id: m.id,
            title: m.title,
            overview: m.overview,
            tagline: m.tagline,
            genres: m.genres,
            keywords: m.keywords,
            release_date: m.release_date,
            runtime: m.runtime,
            budget: m.budget,
            revenue: m.revenue,
        }
    }
}

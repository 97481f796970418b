use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's assessment of a movie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    pub movie_id: String,
    /// Author identity
    pub user_email: String,
    pub rating: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Comment {
    pub fn new(movie_id: String, user_email: String, rating: i32, comment: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            movie_id,
            user_email,
            rating,
            comment,
        }
    }
}

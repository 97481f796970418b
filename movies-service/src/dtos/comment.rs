use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::Comment;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, message = "Movie id is required"))]
    pub movie_id: String,

    #[validate(range(min = 1, max = 10, message = "Rating must be between 1 and 10"))]
    pub rating: i32,

    #[validate(length(max = 2000, message = "Comment is too long"))]
    pub comment: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(range(min = 1, max = 10, message = "Rating must be between 1 and 10"))]
    pub rating: Option<i32>,

    #[validate(length(max = 2000, message = "Comment is too long"))]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: String,
    pub movie_id: String,
    pub user_email: String,
    pub rating: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl From<Comment> for CommentResponse {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            movie_id: c.movie_id,
            user_email: c.user_email,
            rating: c.rating,
            comment: c.comment,
        }
    }
}

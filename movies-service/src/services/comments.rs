use std::sync::Arc;

use crate::dtos::comment::{CreateCommentRequest, UpdateCommentRequest};
use crate::middleware::Caller;
use crate::models::Comment;
use crate::services::error::ServiceError;
use crate::services::permissions::PermissionEvaluator;
use crate::services::store::{CommentRepository, CommentUpdate, MovieRepository, UserRepository};

/// Movie assessments. The author is always the authenticated caller.
#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    users: Arc<dyn UserRepository>,
    movies: Arc<dyn MovieRepository>,
    permissions: PermissionEvaluator,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn CommentRepository>,
        users: Arc<dyn UserRepository>,
        movies: Arc<dyn MovieRepository>,
        permissions: PermissionEvaluator,
    ) -> Self {
        Self {
            comments,
            users,
            movies,
            permissions,
        }
    }

    async fn require_movie(&self, movie_id: &str) -> Result<(), ServiceError> {
        if self.movies.find_movie(movie_id).await?.is_none() {
            return Err(ServiceError::NotFound("Movie"));
        }
        Ok(())
    }

    pub async fn list_for_user(
        &self,
        caller: &Caller,
        email: &str,
    ) -> Result<Vec<Comment>, ServiceError> {
        if self.users.find_user(email).await?.is_none() {
            return Err(ServiceError::NotFound("User"));
        }
        self.permissions.can_read_user_comments(caller, email).await?;
        self.comments.comments_by_user(email).await
    }

    pub async fn list_for_movie(
        &self,
        caller: &Caller,
        movie_id: &str,
    ) -> Result<Vec<Comment>, ServiceError> {
        self.permissions.require_user(caller)?;
        self.require_movie(movie_id).await?;
        self.comments.comments_by_movie(movie_id).await
    }

    pub async fn create(
        &self,
        caller: &Caller,
        req: CreateCommentRequest,
    ) -> Result<Comment, ServiceError> {
        self.permissions.require_user(caller)?;
        self.require_movie(&req.movie_id).await?;

        let comment = Comment::new(req.movie_id, caller.subject.clone(), req.rating, req.comment);
        self.comments.insert_comment(&comment).await?;
        tracing::info!(comment_id = %comment.id, movie_id = %comment.movie_id, "Comment created");
        Ok(comment)
    }

    pub async fn update(
        &self,
        caller: &Caller,
        id: &str,
        req: UpdateCommentRequest,
    ) -> Result<Comment, ServiceError> {
        self.permissions.can_edit_comment(caller, id).await?;

        let update = CommentUpdate {
            rating: req.rating,
            comment: req.comment,
        };
        self.comments
            .update_comment(id, &update)
            .await?
            .ok_or(ServiceError::NotFound("Comment"))
    }

    pub async fn delete(&self, caller: &Caller, id: &str) -> Result<(), ServiceError> {
        self.permissions.can_delete_comment(caller, id).await?;

        if !self.comments.delete_comment(id).await? {
            return Err(ServiceError::NotFound("Comment"));
        }
        tracing::info!(comment_id = id, deleted_by = %caller.subject, "Comment deleted");
        Ok(())
    }
}

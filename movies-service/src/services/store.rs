//! Persistence seams.
//!
//! The first three traits are the only things the authentication core reads.
//! The repository traits carry the CRUD the handlers need. `MongoDb` and
//! `InMemoryStore` implement all of them.

use async_trait::async_trait;

use crate::models::{Comment, Movie, ReleaseDate, User};
use crate::services::error::ServiceError;
use crate::services::roles::AuthoritySet;

/// What login needs to know about an identity.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    pub authorities: AuthoritySet,
    pub secret_hash: String,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_identity(&self, identity: &str)
        -> Result<Option<DirectoryEntry>, ServiceError>;
}

#[async_trait]
pub trait RelationshipGraph: Send + Sync {
    /// Friend list stored on `identity`'s own record; empty when the user is unknown.
    async fn friends_of(&self, identity: &str) -> Result<Vec<String>, ServiceError>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Author of the comment, `None` when it does not exist.
    async fn owner_of(&self, comment_id: &str) -> Result<Option<String>, ServiceError>;
}

/// Partial profile update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub country: Option<String>,
    pub picture: Option<String>,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, email: &str) -> Result<Option<User>, ServiceError>;

    async fn list_users(&self) -> Result<Vec<User>, ServiceError>;

    /// Fails with `Conflict` when the email is taken.
    async fn insert_user(&self, user: &User) -> Result<(), ServiceError>;

    async fn update_profile(
        &self,
        email: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, ServiceError>;

    /// Removes the user, scrubs it from every friend list and deletes the
    /// comments it authored.
    async fn delete_user(&self, email: &str) -> Result<bool, ServiceError>;

    /// Adds each user to the other's friend list.
    async fn link_friends(&self, a: &str, b: &str) -> Result<(), ServiceError>;

    /// Removes each user from the other's friend list.
    async fn unlink_friends(&self, a: &str, b: &str) -> Result<(), ServiceError>;

    async fn health_check(&self) -> Result<(), ServiceError>;
}

#[derive(Debug, Clone, Default)]
pub struct CommentUpdate {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn find_comment(&self, id: &str) -> Result<Option<Comment>, ServiceError>;

    async fn comments_by_user(&self, email: &str) -> Result<Vec<Comment>, ServiceError>;

    async fn comments_by_movie(&self, movie_id: &str) -> Result<Vec<Comment>, ServiceError>;

    async fn insert_comment(&self, comment: &Comment) -> Result<(), ServiceError>;

    async fn update_comment(
        &self,
        id: &str,
        update: &CommentUpdate,
    ) -> Result<Option<Comment>, ServiceError>;

    async fn delete_comment(&self, id: &str) -> Result<bool, ServiceError>;
}

/// Partial movie update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct MovieUpdate {
    pub title: Option<String>,
    pub overview: Option<String>,
    pub tagline: Option<String>,
    pub genres: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
    pub release_date: Option<ReleaseDate>,
    pub runtime: Option<i32>,
    pub budget: Option<i64>,
    pub revenue: Option<i64>,
}

#[async_trait]
pub trait MovieRepository: Send + Sync {
    async fn find_movie(&self, id: &str) -> Result<Option<Movie>, ServiceError>;

    async fn list_movies(&self) -> Result<Vec<Movie>, ServiceError>;

    async fn insert_movie(&self, movie: &Movie) -> Result<(), ServiceError>;

    async fn update_movie(
        &self,
        id: &str,
        update: &MovieUpdate,
    ) -> Result<Option<Movie>, ServiceError>;

    /// Removes the movie and every comment written about it.
    async fn delete_movie(&self, id: &str) -> Result<bool, ServiceError>;
}

/// Everything a backend has to provide.
pub trait Store:
    UserDirectory
    + RelationshipGraph
    + CommentStore
    + UserRepository
    + CommentRepository
    + MovieRepository
{
}

impl<T> Store for T where
    T: UserDirectory
        + RelationshipGraph
        + CommentStore
        + UserRepository
        + CommentRepository
        + MovieRepository
{
}

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::models::{Comment, Movie, User};
use crate::services::error::ServiceError;
use crate::services::store::{
    CommentRepository, CommentStore, CommentUpdate, DirectoryEntry, MovieRepository, MovieUpdate,
    ProfileUpdate, RelationshipGraph, UserDirectory, UserRepository,
};

/// Process-local backend used by the test suites.
#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<String, User>>,
    comments: RwLock<HashMap<String, Comment>>,
    movies: RwLock<HashMap<String, Movie>>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn add_friend(user: &mut User, friend: &str) {
    if !user.friends.iter().any(|f| f == friend) {
        user.friends.push(friend.to_string());
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes `friend` into `owner`'s list only, leaving the reverse edge out.
    pub fn insert_friend_edge(&self, owner: &str, friend: &str) {
        if let Some(user) = write(&self.users).get_mut(owner) {
            add_friend(user, friend);
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn find_by_identity(
        &self,
        identity: &str,
    ) -> Result<Option<DirectoryEntry>, ServiceError> {
        Ok(read(&self.users).get(identity).map(|u| DirectoryEntry {
            authorities: u.authorities(),
            secret_hash: u.password.clone(),
        }))
    }
}

#[async_trait]
impl RelationshipGraph for InMemoryStore {
    async fn friends_of(&self, identity: &str) -> Result<Vec<String>, ServiceError> {
        Ok(read(&self.users)
            .get(identity)
            .map(|u| u.friends.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl CommentStore for InMemoryStore {
    async fn owner_of(&self, comment_id: &str) -> Result<Option<String>, ServiceError> {
        Ok(read(&self.comments)
            .get(comment_id)
            .map(|c| c.user_email.clone()))
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_user(&self, email: &str) -> Result<Option<User>, ServiceError> {
        Ok(read(&self.users).get(email).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        let mut users: Vec<User> = read(&self.users).values().cloned().collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    async fn insert_user(&self, user: &User) -> Result<(), ServiceError> {
        let mut users = write(&self.users);
        if users.contains_key(&user.email) {
            return Err(ServiceError::Conflict(format!(
                "User {} already exists",
                user.email
            )));
        }
        users.insert(user.email.clone(), user.clone());
        Ok(())
    }

    async fn update_profile(
        &self,
        email: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, ServiceError> {
        let mut users = write(&self.users);
        let Some(user) = users.get_mut(email) else {
            return Ok(None);
        };
        if let Some(name) = &update.name {
            user.name = name.clone();
        }
        if let Some(country) = &update.country {
            user.country = Some(country.clone());
        }
        if let Some(picture) = &update.picture {
            user.picture = Some(picture.clone());
        }
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, email: &str) -> Result<bool, ServiceError> {
        let mut users = write(&self.users);
        if users.remove(email).is_none() {
            return Ok(false);
        }
        for user in users.values_mut() {
            user.friends.retain(|f| f != email);
        }
        write(&self.comments).retain(|_, c| c.user_email != email);
        Ok(true)
    }

    async fn link_friends(&self, a: &str, b: &str) -> Result<(), ServiceError> {
        let mut users = write(&self.users);
        if let Some(user) = users.get_mut(a) {
            add_friend(user, b);
        }
        if let Some(user) = users.get_mut(b) {
            add_friend(user, a);
        }
        Ok(())
    }

    async fn unlink_friends(&self, a: &str, b: &str) -> Result<(), ServiceError> {
        let mut users = write(&self.users);
        if let Some(user) = users.get_mut(a) {
            user.friends.retain(|f| f != b);
        }
        if let Some(user) = users.get_mut(b) {
            user.friends.retain(|f| f != a);
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn find_comment(&self, id: &str) -> Result<Option<Comment>, ServiceError> {
        Ok(read(&self.comments).get(id).cloned())
    }

    async fn comments_by_user(&self, email: &str) -> Result<Vec<Comment>, ServiceError> {
        let mut found: Vec<Comment> = read(&self.comments)
            .values()
            .filter(|c| c.user_email == email)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }

    async fn comments_by_movie(&self, movie_id: &str) -> Result<Vec<Comment>, ServiceError> {
        let mut found: Vec<Comment> = read(&self.comments)
            .values()
            .filter(|c| c.movie_id == movie_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<(), ServiceError> {
        let mut comments = write(&self.comments);
        if comments.contains_key(&comment.id) {
            return Err(ServiceError::Conflict(format!(
                "Comment {} already exists",
                comment.id
            )));
        }
        comments.insert(comment.id.clone(), comment.clone());
        Ok(())
    }

    async fn update_comment(
        &self,
        id: &str,
        update: &CommentUpdate,
    ) -> Result<Option<Comment>, ServiceError> {
        let mut comments = write(&self.comments);
        let Some(comment) = comments.get_mut(id) else {
            return Ok(None);
        };
        if let Some(rating) = update.rating {
            comment.rating = rating;
        }
        if let Some(text) = &update.comment {
            comment.comment = Some(text.clone());
        }
        Ok(Some(comment.clone()))
    }

    async fn delete_comment(&self, id: &str) -> Result<bool, ServiceError> {
        Ok(write(&self.comments).remove(id).is_some())
    }
}

#[async_trait]
impl MovieRepository for InMemoryStore {
    async fn find_movie(&self, id: &str) -> Result<Option<Movie>, ServiceError> {
        Ok(read(&self.movies).get(id).cloned())
    }

    async fn list_movies(&self) -> Result<Vec<Movie>, ServiceError> {
        let mut movies: Vec<Movie> = read(&self.movies).values().cloned().collect();
        movies.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        Ok(movies)
    }

    async fn insert_movie(&self, movie: &Movie) -> Result<(), ServiceError> {
        let mut movies = write(&self.movies);
        if movies.contains_key(&movie.id) {
            return Err(ServiceError::Conflict(format!(
                "Movie {} already exists",
                movie.id
            )));
        }
        movies.insert(movie.id.clone(), movie.clone());
        Ok(())
    }

    async fn update_movie(
        &self,
        id: &str,
        update: &MovieUpdate,
    ) -> Result<Option<Movie>, ServiceError> {
        let mut movies = write(&self.movies);
        let Some(movie) = movies.get_mut(id) else {
            return Ok(None);
        };
        if let Some(title) = &update.title {
            movie.title = title.clone();
        }
        if let Some(overview) = &update.overview {
            movie.overview = Some(overview.clone());
        }
        if let Some(tagline) = &update.tagline {
            movie.tagline = Some(tagline.clone());
        }
        if let Some(genres) = &update.genres {
            movie.genres = genres.clone();
        }
        if let Some(keywords) = &update.keywords {
            movie.keywords = keywords.clone();
        }
        if let Some(release_date) = &update.release_date {
            movie.release_date = Some(release_date.clone());
        }
        if let Some(runtime) = update.runtime {
            movie.runtime = Some(runtime);
        }
        if let Some(budget) = update.budget {
            movie.budget = Some(budget);
        }
        if let Some(revenue) = update.revenue {
            movie.revenue = Some(revenue);
        }
        Ok(Some(movie.clone()))
    }

    async fn delete_movie(&self, id: &str) -> Result<bool, ServiceError> {
        if write(&self.movies).remove(id).is_none() {
            return Ok(false);
        }
        write(&self.comments).retain(|_, c| c.movie_id != id);
        Ok(true)
    }
}

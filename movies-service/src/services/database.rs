use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson, Document},
    error::{ErrorKind, WriteFailure},
    options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

use crate::models::{Comment, Movie, User};
use crate::services::error::ServiceError;
use crate::services::store::{
    CommentRepository, CommentStore, CommentUpdate, DirectoryEntry, MovieRepository, MovieUpdate,
    ProfileUpdate, RelationshipGraph, UserDirectory, UserRepository,
};

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

fn db_error(operation: &'static str) -> impl Fn(mongodb::error::Error) -> ServiceError {
    move |e| {
        tracing::error!(operation, error = %e, "MongoDB operation failed");
        ServiceError::Database(e)
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for movies-service");

        // Users are keyed by email in `_id`; the friends index serves the
        // cleanup that runs when a user is deleted.
        let friends_index = IndexModel::builder()
            .keys(doc! { "friends": 1 })
            .options(IndexOptions::builder().name("friends_idx".to_string()).build())
            .build();

        self.users()
            .create_index(friends_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create friends index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        let user_email_index = IndexModel::builder()
            .keys(doc! { "user_email": 1 })
            .options(
                IndexOptions::builder()
                    .name("user_email_idx".to_string())
                    .build(),
            )
            .build();

        self.comments()
            .create_index(user_email_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create user_email index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        let movie_id_index = IndexModel::builder()
            .keys(doc! { "movie_id": 1 })
            .options(IndexOptions::builder().name("movie_id_idx".to_string()).build())
            .build();

        self.comments()
            .create_index(movie_id_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create movie_id index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        let title_index = IndexModel::builder()
            .keys(doc! { "title": 1 })
            .options(IndexOptions::builder().name("title_idx".to_string()).build())
            .build();

        self.movies()
            .create_index(title_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create title index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        tracing::info!("Successfully created all MongoDB indexes");
        Ok(())
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    pub fn comments(&self) -> Collection<Comment> {
        self.db.collection("comments")
    }

    pub fn movies(&self) -> Collection<Movie> {
        self.db.collection("movies")
    }

    async fn find_comments(&self, filter: Document) -> Result<Vec<Comment>, ServiceError> {
        let options = FindOptions::builder().sort(doc! { "_id": 1 }).build();
        let cursor = self
            .comments()
            .find(filter, options)
            .await
            .map_err(db_error("find comments"))?;
        cursor.try_collect().await.map_err(db_error("collect comments"))
    }
}

#[async_trait]
impl UserDirectory for MongoDb {
    async fn find_by_identity(
        &self,
        identity: &str,
    ) -> Result<Option<DirectoryEntry>, ServiceError> {
        let user = self.find_user(identity).await?;
        Ok(user.map(|u| DirectoryEntry {
            authorities: u.authorities(),
            secret_hash: u.password,
        }))
    }
}

#[async_trait]
impl RelationshipGraph for MongoDb {
    async fn friends_of(&self, identity: &str) -> Result<Vec<String>, ServiceError> {
        let user = self.find_user(identity).await?;
        Ok(user.map(|u| u.friends).unwrap_or_default())
    }
}

#[async_trait]
impl CommentStore for MongoDb {
    async fn owner_of(&self, comment_id: &str) -> Result<Option<String>, ServiceError> {
        let comment = self.find_comment(comment_id).await?;
        Ok(comment.map(|c| c.user_email))
    }
}

#[async_trait]
impl UserRepository for MongoDb {
    async fn find_user(&self, email: &str) -> Result<Option<User>, ServiceError> {
        self.users()
            .find_one(doc! { "_id": email }, None)
            .await
            .map_err(db_error("find user"))
    }

    async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        let options = FindOptions::builder().sort(doc! { "_id": 1 }).build();
        let cursor = self
            .users()
            .find(doc! {}, options)
            .await
            .map_err(db_error("list users"))?;
        cursor.try_collect().await.map_err(db_error("collect users"))
    }

    async fn insert_user(&self, user: &User) -> Result<(), ServiceError> {
        match self.users().insert_one(user, None).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(ServiceError::Conflict(format!(
                "User {} already exists",
                user.email
            ))),
            Err(e) => Err(db_error("insert user")(e)),
        }
    }

    async fn update_profile(
        &self,
        email: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, ServiceError> {
        let mut set = Document::new();
        if let Some(name) = &update.name {
            set.insert("name", name.as_str());
        }
        if let Some(country) = &update.country {
            set.insert("country", country.as_str());
        }
        if let Some(picture) = &update.picture {
            set.insert("picture", picture.as_str());
        }
        if set.is_empty() {
            return self.find_user(email).await;
        }

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        self.users()
            .find_one_and_update(doc! { "_id": email }, doc! { "$set": set }, options)
            .await
            .map_err(db_error("update user"))
    }

    async fn delete_user(&self, email: &str) -> Result<bool, ServiceError> {
        let result = self
            .users()
            .delete_one(doc! { "_id": email }, None)
            .await
            .map_err(db_error("delete user"))?;
        if result.deleted_count == 0 {
            return Ok(false);
        }

        self.users()
            .update_many(
                doc! { "friends": email },
                doc! { "$pull": { "friends": email } },
                None,
            )
            .await
            .map_err(db_error("scrub friend lists"))?;

        let removed = self
            .comments()
            .delete_many(doc! { "user_email": email }, None)
            .await
            .map_err(db_error("delete user comments"))?;
        tracing::info!(
            comments = removed.deleted_count,
            "Removed comments of deleted user"
        );
        Ok(true)
    }

    async fn link_friends(&self, a: &str, b: &str) -> Result<(), ServiceError> {
        self.users()
            .update_one(doc! { "_id": a }, doc! { "$addToSet": { "friends": b } }, None)
            .await
            .map_err(db_error("add friend"))?;
        self.users()
            .update_one(doc! { "_id": b }, doc! { "$addToSet": { "friends": a } }, None)
            .await
            .map_err(db_error("add friend"))?;
        Ok(())
    }

    async fn unlink_friends(&self, a: &str, b: &str) -> Result<(), ServiceError> {
        self.users()
            .update_one(doc! { "_id": a }, doc! { "$pull": { "friends": b } }, None)
            .await
            .map_err(db_error("remove friend"))?;
        self.users()
            .update_one(doc! { "_id": b }, doc! { "$pull": { "friends": a } }, None)
            .await
            .map_err(db_error("remove friend"))?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(db_error("ping"))?;
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for MongoDb {
    async fn find_comment(&self, id: &str) -> Result<Option<Comment>, ServiceError> {
        self.comments()
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(db_error("find comment"))
    }

    async fn comments_by_user(&self, email: &str) -> Result<Vec<Comment>, ServiceError> {
        self.find_comments(doc! { "user_email": email }).await
    }

    async fn comments_by_movie(&self, movie_id: &str) -> Result<Vec<Comment>, ServiceError> {
        self.find_comments(doc! { "movie_id": movie_id }).await
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<(), ServiceError> {
        match self.comments().insert_one(comment, None).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(ServiceError::Conflict(format!(
                "Comment {} already exists",
                comment.id
            ))),
            Err(e) => Err(db_error("insert comment")(e)),
        }
    }

    async fn update_comment(
        &self,
        id: &str,
        update: &CommentUpdate,
    ) -> Result<Option<Comment>, ServiceError> {
        let mut set = Document::new();
        if let Some(rating) = update.rating {
            set.insert("rating", rating);
        }
        if let Some(text) = &update.comment {
            set.insert("comment", text.as_str());
        }
        if set.is_empty() {
            return self.find_comment(id).await;
        }

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        self.comments()
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set }, options)
            .await
            .map_err(db_error("update comment"))
    }

    async fn delete_comment(&self, id: &str) -> Result<bool, ServiceError> {
        let result = self
            .comments()
            .delete_one(doc! { "_id": id }, None)
            .await
            .map_err(db_error("delete comment"))?;
        Ok(result.deleted_count > 0)
    }
}

#[async_trait]
impl MovieRepository for MongoDb {
    async fn find_movie(&self, id: &str) -> Result<Option<Movie>, ServiceError> {
        self.movies()
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(db_error("find movie"))
    }

    async fn list_movies(&self) -> Result<Vec<Movie>, ServiceError> {
        let options = FindOptions::builder()
            .sort(doc! { "title": 1, "_id": 1 })
            .build();
        let cursor = self
            .movies()
            .find(doc! {}, options)
            .await
            .map_err(db_error("list movies"))?;
        cursor.try_collect().await.map_err(db_error("collect movies"))
    }

    async fn insert_movie(&self, movie: &Movie) -> Result<(), ServiceError> {
        match self.movies().insert_one(movie, None).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(ServiceError::Conflict(format!(
                "Movie {} already exists",
                movie.id
            ))),
            Err(e) => Err(db_error("insert movie")(e)),
        }
    }

    async fn update_movie(
        &self,
        id: &str,
        update: &MovieUpdate,
    ) -> Result<Option<Movie>, ServiceError> {
        let mut set = Document::new();
        if let Some(title) = &update.title {
            set.insert("title", title.as_str());
        }
        if let Some(overview) = &update.overview {
            set.insert("overview", overview.as_str());
        }
        if let Some(tagline) = &update.tagline {
            set.insert("tagline", tagline.as_str());
        }
        if let Some(genres) = &update.genres {
            set.insert("genres", genres.clone());
        }
        if let Some(keywords) = &update.keywords {
            set.insert("keywords", keywords.clone());
        }
        if let Some(release_date) = &update.release_date {
            let value = to_bson(release_date).map_err(|e| ServiceError::Internal(e.into()))?;
            set.insert("release_date", value);
        }
        if let Some(runtime) = update.runtime {
            set.insert("runtime", runtime);
        }
        if let Some(budget) = update.budget {
            set.insert("budget", budget);
        }
        if let Some(revenue) = update.revenue {
            set.insert("revenue", revenue);
        }
        if set.is_empty() {
            return self.find_movie(id).await;
        }

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        self.movies()
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set }, options)
            .await
            .map_err(db_error("update movie"))
    }

    async fn delete_movie(&self, id: &str) -> Result<bool, ServiceError> {
        let result = self
            .movies()
            .delete_one(doc! { "_id": id }, None)
            .await
            .map_err(db_error("delete movie"))?;
        if result.deleted_count == 0 {
            return Ok(false);
        }

        self.comments()
            .delete_many(doc! { "movie_id": id }, None)
            .await
            .map_err(db_error("delete movie comments"))?;
        Ok(true)
    }
}

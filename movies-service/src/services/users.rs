use std::sync::Arc;

use crate::dtos::user::{RegisterRequest, UpdateUserRequest};
use crate::middleware::Caller;
use crate::models::{SanitizedUser, User};
use crate::services::error::ServiceError;
use crate::services::permissions::PermissionEvaluator;
use crate::services::store::{ProfileUpdate, UserRepository};
use crate::utils::{hash_password, Password};

/// User records and the friendship relation.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    permissions: PermissionEvaluator,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, permissions: PermissionEvaluator) -> Self {
        Self { users, permissions }
    }

    async fn existing(&self, email: &str) -> Result<User, ServiceError> {
        self.users
            .find_user(email)
            .await?
            .ok_or(ServiceError::NotFound("User"))
    }

    #[tracing::instrument(skip(self, req), fields(email = %req.email))]
    pub async fn register(&self, req: RegisterRequest) -> Result<SanitizedUser, ServiceError> {
        let hash = hash_password(&Password::new(req.password))?;

        let mut user = User::new(req.email, req.name, hash.into_string());
        user.country = req.country;
        user.picture = req.picture;

        self.users.insert_user(&user).await?;
        tracing::info!(email = %user.email, "User registered");
        Ok(user.sanitized())
    }

    pub async fn get(&self, caller: &Caller, email: &str) -> Result<SanitizedUser, ServiceError> {
        self.permissions.require_user(caller)?;
        Ok(self.existing(email).await?.sanitized())
    }

    pub async fn list(&self, caller: &Caller) -> Result<Vec<SanitizedUser>, ServiceError> {
        self.permissions.require_user(caller)?;
        let users = self.users.list_users().await?;
        Ok(users.into_iter().map(SanitizedUser::from).collect())
    }

    pub async fn update_profile(
        &self,
        caller: &Caller,
        email: &str,
        req: UpdateUserRequest,
    ) -> Result<SanitizedUser, ServiceError> {
        self.existing(email).await?;
        self.permissions.can_manage_user(caller, email).await?;

        if req.is_empty() {
            return Err(ServiceError::Validation(
                "At least one field must be provided".to_string(),
            ));
        }

        let update = ProfileUpdate {
            name: req.name,
            country: req.country,
            picture: req.picture,
        };
        let user = self
            .users
            .update_profile(email, &update)
            .await?
            .ok_or(ServiceError::NotFound("User"))?;
        Ok(user.sanitized())
    }

    pub async fn delete(&self, caller: &Caller, email: &str) -> Result<(), ServiceError> {
        self.existing(email).await?;
        self.permissions.can_manage_user(caller, email).await?;

        if !self.users.delete_user(email).await? {
            return Err(ServiceError::NotFound("User"));
        }
        tracing::info!(email, deleted_by = %caller.subject, "User deleted");
        Ok(())
    }

    /// Records the friendship on both users.
    pub async fn add_friend(
        &self,
        caller: &Caller,
        owner: &str,
        friend: &str,
    ) -> Result<SanitizedUser, ServiceError> {
        self.existing(owner).await?;
        self.permissions.can_edit_friends(caller, owner).await?;

        if owner == friend {
            return Err(ServiceError::Validation(
                "Cannot add yourself as a friend".to_string(),
            ));
        }
        self.existing(friend).await?;

        self.users.link_friends(owner, friend).await?;
        tracing::info!(owner, friend, "Friendship added");
        Ok(self.existing(owner).await?.sanitized())
    }

    pub async fn remove_friend(
        &self,
        caller: &Caller,
        owner: &str,
        friend: &str,
    ) -> Result<SanitizedUser, ServiceError> {
        self.existing(owner).await?;
        self.permissions.can_edit_friends(caller, owner).await?;

        self.users.unlink_friends(owner, friend).await?;
        tracing::info!(owner, friend, "Friendship removed");
        Ok(self.existing(owner).await?.sanitized())
    }
}

//! Resource-scoped authorization decisions.
//!
//! Predicates never fail for a "no" answer; only store lookups can error.
//! Existence of the target is resolved before any rule is evaluated, so a
//! missing resource is reported as not-found even to callers who would have
//! been denied. This reveals existence to authenticated callers and is
//! accepted.
//!
//! Friendship is read from the resource owner's list only. The user service
//! keeps the relation symmetric, but a half-written edge can at most grant
//! access to someone the owner's own record names.

use std::sync::Arc;

use crate::middleware::Caller;
use crate::services::error::ServiceError;
use crate::services::roles::{Authority, RoleHierarchy};
use crate::services::store::{CommentStore, RelationshipGraph};

/// One alternative in an endpoint policy.
#[derive(Debug, Clone)]
pub enum Rule<'a> {
    /// Caller holds the authority, directly or through the hierarchy.
    Role(Authority),
    /// Caller is the given identity.
    SelfOf(&'a str),
    /// Caller appears in the given identity's friend list.
    FriendOf(&'a str),
}

#[derive(Clone)]
pub struct PermissionEvaluator {
    roles: Arc<RoleHierarchy>,
    graph: Arc<dyn RelationshipGraph>,
    comments: Arc<dyn CommentStore>,
}

impl PermissionEvaluator {
    pub fn new(
        roles: Arc<RoleHierarchy>,
        graph: Arc<dyn RelationshipGraph>,
        comments: Arc<dyn CommentStore>,
    ) -> Self {
        Self {
            roles,
            graph,
            comments,
        }
    }

    pub fn is_self(caller: &Caller, owner: &str) -> bool {
        caller.subject == owner
    }

    pub fn has_role(&self, caller: &Caller, required: &Authority) -> bool {
        self.roles.satisfies(&caller.authorities, required)
    }

    pub async fn is_friend(&self, caller: &Caller, owner: &str) -> Result<bool, ServiceError> {
        let friends = self.graph.friends_of(owner).await?;
        Ok(friends.iter().any(|f| f == &caller.subject))
    }

    /// `NotFound` when the comment does not exist.
    pub async fn owns_comment(
        &self,
        caller: &Caller,
        comment_id: &str,
    ) -> Result<bool, ServiceError> {
        let owner = self.comment_owner(comment_id).await?;
        Ok(Self::is_self(caller, &owner))
    }

    pub async fn comment_owner(&self, comment_id: &str) -> Result<String, ServiceError> {
        self.comments
            .owner_of(comment_id)
            .await?
            .ok_or(ServiceError::NotFound("Comment"))
    }

    /// True as soon as one rule holds; rules are tried in order.
    pub async fn allows_any(&self, caller: &Caller, rules: &[Rule<'_>]) -> Result<bool, ServiceError> {
        for rule in rules {
            let allowed = match rule {
                Rule::Role(authority) => self.has_role(caller, authority),
                Rule::SelfOf(owner) => Self::is_self(caller, owner),
                Rule::FriendOf(owner) => self.is_friend(caller, owner).await?,
            };
            if allowed {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// `allows_any`, turning a denial into `Forbidden`.
    pub async fn require_any(&self, caller: &Caller, rules: &[Rule<'_>]) -> Result<(), ServiceError> {
        if self.allows_any(caller, rules).await? {
            Ok(())
        } else {
            tracing::info!(subject = %caller.subject, ?rules, "Permission denied");
            Err(ServiceError::Forbidden)
        }
    }

    /// Every authenticated endpoint needs the standard user authority.
    pub fn require_user(&self, caller: &Caller) -> Result<(), ServiceError> {
        if self.has_role(caller, &Authority::user()) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden)
        }
    }

    /// Reading a user's comments: admin, the owner, or a friend of the owner.
    pub async fn can_read_user_comments(
        &self,
        caller: &Caller,
        owner: &str,
    ) -> Result<(), ServiceError> {
        self.require_user(caller)?;
        self.require_any(
            caller,
            &[
                Rule::Role(Authority::admin()),
                Rule::SelfOf(owner),
                Rule::FriendOf(owner),
            ],
        )
        .await
    }

    /// Updating or deleting a user record: admin or the user themself.
    pub async fn can_manage_user(&self, caller: &Caller, target: &str) -> Result<(), ServiceError> {
        self.require_user(caller)?;
        self.require_any(caller, &[Rule::Role(Authority::admin()), Rule::SelfOf(target)])
            .await
    }

    /// Editing a friend list: only its owner.
    pub async fn can_edit_friends(&self, caller: &Caller, target: &str) -> Result<(), ServiceError> {
        self.require_user(caller)?;
        self.require_any(caller, &[Rule::SelfOf(target)]).await
    }

    /// Editing a comment: only its author. Checks existence first.
    pub async fn can_edit_comment(
        &self,
        caller: &Caller,
        comment_id: &str,
    ) -> Result<(), ServiceError> {
        self.require_user(caller)?;
        let owner = self.comment_owner(comment_id).await?;
        self.require_any(caller, &[Rule::SelfOf(&owner)]).await
    }

    /// Changing the catalogue: admin only.
    pub async fn can_manage_movies(&self, caller: &Caller) -> Result<(), ServiceError> {
        self.require_user(caller)?;
        self.require_any(caller, &[Rule::Role(Authority::admin())]).await
    }

    /// Deleting a comment: admin or its author. Checks existence first.
    pub async fn can_delete_comment(
        &self,
        caller: &Caller,
        comment_id: &str,
    ) -> Result<(), ServiceError> {
        self.require_user(caller)?;
        let owner = self.comment_owner(comment_id).await?;
        self.require_any(caller, &[Rule::Role(Authority::admin()), Rule::SelfOf(&owner)])
            .await
    }
}

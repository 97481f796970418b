//! Services layer for movies-service.
//!
//! Token handling, credential checks and permission decisions, plus the
//! user, movie and comment operations built on them.

pub mod comments;
pub mod credentials;
mod database;
pub mod error;
pub mod memory;
pub mod movies;
pub mod permissions;
pub mod roles;
pub mod store;
pub mod token;
pub mod users;

pub use comments::CommentService;
pub use credentials::CredentialVerifier;
pub use database::MongoDb;
pub use error::ServiceError;
pub use memory::InMemoryStore;
pub use movies::MovieService;
pub use permissions::{PermissionEvaluator, Rule};
pub use roles::{Authority, AuthoritySet, RoleHierarchy, RoleHierarchyError};
pub use store::Store;
pub use token::{IssuedToken, TokenCodec, TokenError, VerifiedToken};
pub use users::UserService;

pub mod auth;
pub mod comment;
pub mod movie;
pub mod user;

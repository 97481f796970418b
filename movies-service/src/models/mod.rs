pub mod comment;
pub mod movie;
pub mod user;

pub use comment::Comment;
pub use movie::{Movie, ReleaseDate};
pub use user::{SanitizedUser, User};

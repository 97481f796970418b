pub mod auth;

pub use auth::{authorization_middleware, AuthGate, Caller};

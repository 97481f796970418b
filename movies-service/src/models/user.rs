use serde::{Deserialize, Serialize};

use crate::services::roles::{Authority, AuthoritySet};

/// User document. The email is the stable identity and the document key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Emails of friends. Kept symmetric by the user service.
    #[serde(default)]
    pub friends: Vec<String>,
    /// Argon2 PHC string
    pub password: String,
    #[serde(default)]
    pub roles: Vec<Authority>,
}

impl User {
    pub fn new(email: String, name: String, password_hash: String) -> Self {
        Self {
            email,
            name,
            country: None,
            picture: None,
            friends: Vec::new(),
            password: password_hash,
            roles: vec![Authority::user()],
        }
    }

    pub fn authorities(&self) -> AuthoritySet {
        self.roles.iter().cloned().collect()
    }

    pub fn sanitized(&self) -> SanitizedUser {
        SanitizedUser::from(self.clone())
    }
}

/// User as returned over HTTP: no password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanitizedUser {
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub friends: Vec<String>,
    pub roles: Vec<Authority>,
}

impl From<User> for SanitizedUser {
    fn from(u: User) -> Self {
        Self {
            email: u.email,
            name: u.name,
            country: u.country,
            picture: u.picture,
            friends: u.friends,
            roles: u.roles,
        }
    }
}

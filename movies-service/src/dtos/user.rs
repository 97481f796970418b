use serde::Deserialize;
use validator::Validate;

#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    pub country: Option<String>,

    #[validate(url(message = "Picture must be a URL"))]
    pub picture: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: Option<String>,

    pub country: Option<String>,

    #[validate(url(message = "Picture must be a URL"))]
    pub picture: Option<String>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.country.is_none() && self.picture.is_none()
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddFriendRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

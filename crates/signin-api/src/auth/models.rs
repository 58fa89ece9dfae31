//! Request models for the authentication API
//!
//! Records themselves (`User`, `Role`, `AuthResult`) live in `signin_core`.
//! Both request types hold a plaintext password, so their `Debug` output
//! masks it.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Sign-in credentials
#[derive(Clone, Serialize, Deserialize, ToSchema)]
pub struct SigninRequest {
    #[serde(rename = "userName", alias = "username")]
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for SigninRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigninRequest")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// User create/update payload
#[derive(Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    #[serde(rename = "userName", alias = "username")]
    #[validate(length(min = 1, max = 64, message = "must be 1-64 characters"))]
    pub username: String,

    #[validate(length(min = 1, max = 1024, message = "must not be empty"))]
    pub password: String,

    #[serde(default)]
    #[validate(length(max = 128, message = "must be at most 128 characters"))]
    pub full_name: String,

    #[validate(length(min = 1, message = "must not be empty"))]
    pub role_name: String,
}

impl UserDto {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        full_name: impl Into<String>,
        role_name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            full_name: full_name.into(),
            role_name: role_name.into(),
        }
    }
}

impl std::fmt::Debug for UserDto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserDto")
            .field("username", &self.username)
            .field("password", &"********")
            .field("full_name", &self.full_name)
            .field("role_name", &self.role_name)
            .finish()
    }
}

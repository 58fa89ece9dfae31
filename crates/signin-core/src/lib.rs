//! Signin Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used by the signin service:
//! - User and role records
//! - The authentication result returned to callers
//! - Error codes shared by every surface
//! - Storage traits for users and roles (in-memory and PostgreSQL)
//! - Configuration management

pub mod config;
pub mod postgres;
pub mod repository;

pub use config::{
    AppConfig, ConfigError, DatabaseConfig, HashingConfig, LoggingConfig, SeedConfig,
    ServerConfig, StoreBackend, TokenConfig,
};
pub use postgres::PgStore;
pub use repository::{InMemoryStore, RepositoryError, RoleRepository, UserRepository};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============================================================================
// Error Codes
// ============================================================================

/// Result codes surfaced to callers
///
/// Expected domain failures travel as one of these codes rather than as
/// unhandled errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Unknown username or wrong password (never distinguished)
    InvalidUser,
    /// Referenced role or user does not exist
    NotFound,
    /// Username is already taken
    AlreadyExists,
    /// Malformed input
    BadRequest,
    /// Missing or invalid bearer token
    Unauthorized,
    /// Authenticated but lacking the required role
    Forbidden,
    /// Storage or crypto collaborator failure
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidUser => "INVALID_USER",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::AlreadyExists => "ALREADY_EXISTS",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Records
// ============================================================================

/// Named authorization grant (e.g. "ADMIN", "USER")
///
/// Roles are shared: any number of users may reference the same role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    /// Identifier assigned by the store
    #[serde(rename = "roleId", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Unique role name
    pub role_name: String,
}

impl Role {
    /// A role that has not been persisted yet
    pub fn new(role_name: impl Into<String>) -> Self {
        Self {
            id: None,
            role_name: role_name.into(),
        }
    }
}

/// User account record
///
/// The plaintext password is never held here. `password_hash` is an
/// Argon2id PHC string and is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identifier assigned by the store
    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Unique login name
    #[serde(rename = "userName")]
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub full_name: String,
    /// Exactly one role per user
    pub role: Role,
}

impl User {
    /// Create a user that has not been persisted yet
    pub fn new(
        username: impl Into<String>,
        password_hash: impl Into<String>,
        full_name: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id: None,
            username: username.into(),
            password_hash: password_hash.into(),
            full_name: full_name.into(),
            role,
        }
    }

    /// Role names carried into issued tokens
    pub fn role_names(&self) -> Vec<String> {
        vec![self.role.role_name.clone()]
    }
}

// ============================================================================
// Authentication Result
// ============================================================================

/// Outcome of a sign-in attempt
///
/// `auth_code` holds the token on success and the error code on failure.
/// Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResult {
    pub authorized: bool,
    pub auth_code: String,
    pub valid_minutes: i64,
}

impl AuthResult {
    /// Successful sign-in carrying the issued token
    pub fn granted(token: impl Into<String>, valid_minutes: i64) -> Self {
        Self {
            authorized: true,
            auth_code: token.into(),
            valid_minutes,
        }
    }

    /// Failed sign-in; identical for unknown users and wrong passwords
    pub fn denied() -> Self {
        Self {
            authorized: false,
            auth_code: ErrorCode::InvalidUser.as_str().to_string(),
            valid_minutes: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_strings() {
        assert_eq!(ErrorCode::InvalidUser.as_str(), "INVALID_USER");
        assert_eq!(ErrorCode::NotFound.to_string(), "NOT_FOUND");
        assert_eq!(
            serde_json::to_string(&ErrorCode::AlreadyExists).unwrap(),
            "\"ALREADY_EXISTS\""
        );
    }

    #[test]
    fn test_denied_result() {
        let result = AuthResult::denied();
        assert!(!result.authorized);
        assert_eq!(result.auth_code, "INVALID_USER");
        assert_eq!(result.valid_minutes, 0);
    }

    #[test]
    fn test_auth_result_wire_format() {
        let result = AuthResult::granted("abc.def.ghi", 60);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["authorized"], true);
        assert_eq!(json["authCode"], "abc.def.ghi");
        assert_eq!(json["validMinutes"], 60);
    }

    #[test]
    fn test_user_never_serializes_hash() {
        let user = User::new("alice", "$argon2id$v=19$secret", "Alice", Role::new("USER"));
        let json = serde_json::to_string(&user).unwrap();

        assert!(json.contains("\"userName\":\"alice\""));
        assert!(json.contains("\"fullName\":\"Alice\""));
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("passwordHash"));
    }

    #[test]
    fn test_role_names() {
        let user = User::new("bob", "hash", "Bob", Role::new("ADMIN"));
        assert_eq!(user.role_names(), vec!["ADMIN".to_string()]);
    }
}

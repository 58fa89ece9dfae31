//! Authentication module
//!
//! This module provides the sign-in flow and its collaborators:
//! - Token issuance and validation (HS256 JWT)
//! - Password hashing with Argon2id
//! - Middleware for request authentication
//! - User service for sign-in and user/role records
//! - Request models

pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;

pub use jwt::{Claims, IssuedToken, JwtConfig, TokenError, TokenIssuer};
pub use middleware::{auth_middleware, require_admin, AuthError, AuthenticatedUser, ADMIN_ROLE};
pub use models::{SigninRequest, UserDto};
pub use password::{hash_password, hash_password_with_config, verify_password, PasswordConfig};
pub use service::{ServiceError, UserService};

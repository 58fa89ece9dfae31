//! User service layer
//!
//! Credential verification and token issuance, plus create/update/delete
//! of user records and role seeding. Storage is reached through the
//! repository traits from `signin_core`, so the same service runs on the
//! in-memory store and on PostgreSQL.

use super::jwt::{TokenError, TokenIssuer};
use super::models::UserDto;
use super::password::{hash_password_with_config, verify_password, PasswordConfig, PasswordError};
use crate::audit::{audit_log, AuditContext, AuditEvent};
use signin_core::{
    AuthResult, ErrorCode, RepositoryError, Role, RoleRepository, User, UserRepository,
};
use std::sync::Arc;
use thiserror::Error;
use validator::Validate;

/// Service errors
///
/// Bad credentials are not an error: `signin` reports them through
/// `AuthResult`. Everything here is either a domain failure with a code or
/// a collaborator failure.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Storage failure: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Password hashing failure: {0}")]
    Password(#[from] PasswordError),

    #[error("Token issuance failure: {0}")]
    Token(#[from] TokenError),
}

impl ServiceError {
    /// Result code reported to callers
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::NotFound(_) => ErrorCode::NotFound,
            ServiceError::AlreadyExists(_) => ErrorCode::AlreadyExists,
            ServiceError::Validation(_) => ErrorCode::BadRequest,
            ServiceError::Repository(RepositoryError::Conflict(_)) => ErrorCode::AlreadyExists,
            ServiceError::Repository(RepositoryError::NotFound(_)) => ErrorCode::NotFound,
            ServiceError::Repository(RepositoryError::Database(_))
            | ServiceError::Password(_)
            | ServiceError::Token(_) => ErrorCode::InternalError,
        }
    }
}

const DUMMY_PASSWORD: &str = "signin-placeholder-password";

/// User service
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    roles: Arc<dyn RoleRepository>,
    issuer: TokenIssuer,
    password_config: PasswordConfig,
    /// Hash checked when no stored hash exists, so denials cost the same
    dummy_hash: Arc<str>,
}

impl UserService {
    /// Create a new user service from its collaborators
    pub fn new(
        users: Arc<dyn UserRepository>,
        roles: Arc<dyn RoleRepository>,
        issuer: TokenIssuer,
        password_config: PasswordConfig,
    ) -> Self {
        let dummy_hash = match hash_password_with_config(DUMMY_PASSWORD, &password_config) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!(error = %e, "Could not prepare the placeholder password hash");
                String::new()
            }
        };

        Self {
            users,
            roles,
            issuer,
            password_config,
            dummy_hash: dummy_hash.into(),
        }
    }

    /// Token issuer shared with the request middleware
    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Verify credentials and issue a token
    ///
    /// Unknown usernames and wrong passwords produce the same
    /// `INVALID_USER` result.
    ///
    /// # Returns
    ///
    /// * `Ok(AuthResult)` - Granted with a token, or denied
    /// * `Err(ServiceError)` - Only when a collaborator fails
    pub async fn signin(&self, username: &str, password: &str) -> Result<AuthResult, ServiceError> {
        self.signin_with_context(username, password, &AuditContext::default())
            .await
    }

    /// `signin` with request metadata for the audit trail
    pub async fn signin_with_context(
        &self,
        username: &str,
        password: &str,
        context: &AuditContext,
    ) -> Result<AuthResult, ServiceError> {
        tracing::debug!("Sign-in attempt");

        if username.is_empty() {
            self.burn_verification(password);
            return Ok(self.deny(username, "empty_username", context));
        }

        let Some(user) = self.users.find_by_username(username).await? else {
            self.burn_verification(password);
            return Ok(self.deny(username, "unknown_user", context));
        };

        let password_valid = match verify_password(password, &user.password_hash) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!(username = %user.username, error = %e, "Stored password hash is unusable");
                false
            }
        };

        if !password_valid {
            return Ok(self.deny(username, "bad_password", context));
        }

        let roles = user.role_names();
        let issued = self.issuer.issue(&user.username, &roles)?;

        audit_log(&AuditEvent::SigninSuccess {
            username: user.username.clone(),
            roles,
            ip_address: context.ip_address.clone(),
            user_agent: context.user_agent.clone(),
        });

        Ok(AuthResult::granted(issued.token, issued.valid_minutes))
    }

    /// Run the same Argon2 check a known user would get; the result is discarded
    fn burn_verification(&self, password: &str) {
        let _ = verify_password(password, &self.dummy_hash);
    }

    fn deny(&self, username: &str, reason: &str, context: &AuditContext) -> AuthResult {
        audit_log(&AuditEvent::SigninFailure {
            username: username.to_string(),
            reason: reason.to_string(),
            ip_address: context.ip_address.clone(),
            user_agent: context.user_agent.clone(),
        });
        AuthResult::denied()
    }

    /// Hash a plaintext password with the configured parameters
    pub fn encode_password(&self, password: &str) -> Result<String, ServiceError> {
        Ok(hash_password_with_config(password, &self.password_config)?)
    }

    /// Create a new user
    ///
    /// Fails with `NotFound` if the role does not exist and with
    /// `AlreadyExists` if the username is taken. Nothing is written in
    /// either case.
    pub async fn create_user(&self, dto: UserDto) -> Result<User, ServiceError> {
        let role = self.resolve(&dto).await?;

        if self.users.find_by_username(&dto.username).await?.is_some() {
            return Err(ServiceError::AlreadyExists(format!("User '{}'", dto.username)));
        }

        let user = self.to_record(dto, role, None)?;
        tracing::info!(username = %user.username, "Create user");

        self.users.save(user).await.map_err(conflict_as_exists)
    }

    /// Update an existing user, found by username
    ///
    /// The identifier is preserved and the password is re-hashed.
    pub async fn update_user(&self, dto: UserDto) -> Result<User, ServiceError> {
        let role = self.resolve(&dto).await?;

        let existing = self
            .users
            .find_by_username(&dto.username)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User '{}'", dto.username)))?;

        let user = self.to_record(dto, role, existing.id)?;
        tracing::info!(username = %user.username, "Update user");

        self.users.save(user).await.map_err(conflict_as_exists)
    }

    /// Create the user, or update it if the username already exists
    pub async fn upsert_user(&self, dto: UserDto) -> Result<User, ServiceError> {
        let role = self.resolve(&dto).await?;

        let existing_id = self
            .users
            .find_by_username(&dto.username)
            .await?
            .and_then(|u| u.id);

        let user = self.to_record(dto, role, existing_id)?;
        tracing::info!(username = %user.username, existing = existing_id.is_some(), "Upsert user");

        self.users.save(user).await.map_err(conflict_as_exists)
    }

    /// Delete a user by identifier
    pub async fn delete_user(&self, id: i64) -> Result<(), ServiceError> {
        tracing::warn!(user_id = id, "Delete user");

        if !self.users.delete_by_id(id).await? {
            return Err(ServiceError::NotFound(format!("User {id}")));
        }
        Ok(())
    }

    /// All users, in no particular order
    pub async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        Ok(self.users.find_all().await?)
    }

    /// All roles, in no particular order
    pub async fn list_roles(&self) -> Result<Vec<Role>, ServiceError> {
        Ok(self.roles.find_all().await?)
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.users.find_by_username(username).await?)
    }

    pub async fn find_role(&self, name: &str) -> Result<Role, ServiceError> {
        self.roles
            .find_by_name(name)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Role '{name}'")))
    }

    /// Ensure the named roles exist; existing roles are left untouched
    pub async fn save_roles(&self, names: &[String]) -> Result<Vec<Role>, ServiceError> {
        let roles = names.iter().map(Role::new).collect();
        let saved = self.roles.save_all(roles).await?;
        tracing::info!(count = saved.len(), "Roles saved");
        Ok(saved)
    }

    async fn resolve(&self, dto: &UserDto) -> Result<Role, ServiceError> {
        dto.validate()
            .map_err(|e| ServiceError::Validation(e.to_string()))?;
        self.find_role(&dto.role_name).await
    }

    fn to_record(&self, dto: UserDto, role: Role, id: Option<i64>) -> Result<User, ServiceError> {
        let password_hash = self.encode_password(&dto.password)?;
        let mut user = User::new(dto.username, password_hash, dto.full_name, role);
        user.id = id;
        Ok(user)
    }
}

fn conflict_as_exists(e: RepositoryError) -> ServiceError {
    match e {
        RepositoryError::Conflict(what) => ServiceError::AlreadyExists(what),
        other => ServiceError::Repository(other),
    }
}

/// Authentication middleware for protecting routes
///
/// Extracts and validates bearer tokens from the Authorization header
/// with the issuer held in application state. On success, adds the
/// authenticated user to request extensions.
use super::jwt::{Claims, TokenError};
use crate::audit::{audit_log, extract_ip_address, extract_user_agent, AuditEvent};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use signin_core::ErrorCode;
use std::sync::Arc;
use thiserror::Error;
use utoipa::ToSchema;

/// Role required for user mutations
pub const ADMIN_ROLE: &str = "ADMIN";

/// Authenticated user information extracted from a token
///
/// Handlers read it with `Extension<AuthenticatedUser>`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub username: String,
    pub roles: Vec<String>,
    /// Token identifier
    pub jti: String,
    /// Expiration timestamp (Unix epoch)
    pub expires_at: u64,
}

impl AuthenticatedUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            username: claims.sub,
            roles: claims.roles,
            jti: claims.jti,
            expires_at: claims.exp,
        }
    }
}

/// Authentication middleware errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingAuthHeader,

    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] TokenError),

    #[error("Insufficient permissions")]
    InsufficientPermissions,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AuthError::MissingAuthHeader => (
                StatusCode::UNAUTHORIZED,
                ErrorCode::Unauthorized,
                "Missing Authorization header",
            ),
            AuthError::InvalidAuthHeader => (
                StatusCode::UNAUTHORIZED,
                ErrorCode::Unauthorized,
                "Invalid Authorization header format",
            ),
            AuthError::InvalidToken(_) => (
                StatusCode::UNAUTHORIZED,
                ErrorCode::Unauthorized,
                "Invalid or expired token",
            ),
            AuthError::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                ErrorCode::Forbidden,
                "Insufficient permissions",
            ),
        };

        let body = serde_json::json!({
            "code": code.as_str(),
            "message": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Authentication middleware that requires a valid bearer token
///
/// This middleware:
/// 1. Extracts the Authorization header
/// 2. Validates the Bearer token format
/// 3. Validates signature, issuer and expiry with the state's issuer
/// 4. Adds `AuthenticatedUser` to request extensions
///
/// # Usage
///
/// ```ignore
/// let protected = Router::new()
///     .route("/users", get(list_users_handler))
///     .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));
/// ```
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)?;

    let claims = match state.service.issuer().validate(token) {
        Ok(c) => c,
        Err(e) => {
            audit_log(&AuditEvent::InvalidToken {
                ip_address: extract_ip_address(request.headers()),
                user_agent: extract_user_agent(request.headers()),
                reason: e.to_string(),
            });
            return Err(AuthError::InvalidToken(e));
        }
    };

    request
        .extensions_mut()
        .insert(AuthenticatedUser::from(claims));

    Ok(next.run(request).await)
}

/// Require the `ADMIN` role
///
/// Must run after `auth_middleware`.
pub async fn require_admin(request: Request<Body>, next: Next) -> Result<Response, AuthError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or(AuthError::MissingAuthHeader)?;

    if !user.is_admin() {
        audit_log(&AuditEvent::AccessDenied {
            username: user.username.clone(),
            resource: format!("{} {}", request.method(), request.uri().path()),
            required_role: ADMIN_ROLE.to_string(),
            ip_address: extract_ip_address(request.headers()),
        });
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(roles: &[&str]) -> AuthenticatedUser {
        AuthenticatedUser {
            username: "alice".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            jti: "jti".to_string(),
            expires_at: 0,
        }
    }

    #[test]
    fn test_role_checks() {
        assert!(user(&["ADMIN"]).is_admin());
        assert!(!user(&["USER"]).is_admin());
        assert!(user(&["USER"]).has_role("USER"));
        assert!(!user(&[]).has_role("USER"));
    }

    #[test]
    fn test_from_claims() {
        let claims = Claims {
            iss: "signin-api".to_string(),
            sub: "bob".to_string(),
            jti: "abc".to_string(),
            iat: 1,
            exp: 3601,
            roles: vec!["USER".to_string()],
        };

        let user = AuthenticatedUser::from(claims);
        assert_eq!(user.username, "bob");
        assert_eq!(user.jti, "abc");
        assert_eq!(user.expires_at, 3601);
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AuthError::MissingAuthHeader.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidToken(TokenError::Expired)
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InsufficientPermissions.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}

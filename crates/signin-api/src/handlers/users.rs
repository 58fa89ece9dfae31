//! User and role record handlers
//!
//! Reads need any valid token; mutations additionally need `ADMIN`.
//!
//! Author: hephaex@gmail.com

use crate::audit::{audit_log, AuditEvent};
use crate::auth::{AuthenticatedUser, UserDto};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use signin_core::{Role, User};
use std::sync::Arc;

/// List all users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    responses(
        (status = 200, description = "All users", body = Vec<User>),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.service.list_users().await?))
}

/// Create a user
///
/// # Responses
///
/// * `201 Created` - User created
/// * `400 Bad Request` - Invalid payload
/// * `404 Not Found` - Role does not exist
/// * `409 Conflict` - Username already taken
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    request_body = UserDto,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid payload", body = crate::error::ApiError),
        (status = 403, description = "Requires ADMIN"),
        (status = 404, description = "Role not found", body = crate::error::ApiError),
        (status = 409, description = "Username taken", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_user_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<AuthenticatedUser>,
    Json(dto): Json<UserDto>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.service.create_user(dto).await?;

    audit_log(&AuditEvent::UserCreated {
        user_id: user.id.unwrap_or_default(),
        username: user.username.clone(),
        role: user.role.role_name.clone(),
        actor: Some(actor.username),
    });

    Ok((StatusCode::CREATED, Json(user)))
}

/// Update an existing user, found by username
#[utoipa::path(
    put,
    path = "/api/v1/users",
    tag = "users",
    request_body = UserDto,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Invalid payload", body = crate::error::ApiError),
        (status = 403, description = "Requires ADMIN"),
        (status = 404, description = "User or role not found", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_user_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<AuthenticatedUser>,
    Json(dto): Json<UserDto>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.service.update_user(dto).await?;

    audit_log(&AuditEvent::UserUpdated {
        user_id: user.id.unwrap_or_default(),
        username: user.username.clone(),
        role: user.role.role_name.clone(),
        actor: Some(actor.username),
    });

    Ok(Json(user))
}

/// Delete a user by identifier
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "users",
    params(
        ("id" = i64, Path, description = "User identifier")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Requires ADMIN"),
        (status = 404, description = "User not found", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.service.delete_user(id).await?;

    audit_log(&AuditEvent::UserDeleted {
        user_id: id,
        actor: Some(actor.username),
    });

    Ok(StatusCode::NO_CONTENT)
}

/// List all roles
#[utoipa::path(
    get,
    path = "/api/v1/roles",
    tag = "roles",
    responses(
        (status = 200, description = "All roles", body = Vec<Role>),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_roles_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.service.list_roles().await?))
}

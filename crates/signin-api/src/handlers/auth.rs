//! Authentication API handlers
//!
//! Author: hephaex@gmail.com

use crate::audit::AuditContext;
use crate::auth::{AuthenticatedUser, SigninRequest};
use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, http::HeaderMap, response::IntoResponse, Extension, Json};
use signin_core::AuthResult;
use std::sync::Arc;

/// Sign in with username and password
///
/// Always answers 200 for well-formed requests; `authorized` tells whether
/// the credentials were accepted. Unknown users and wrong passwords both
/// yield `authCode = "INVALID_USER"`.
///
/// # Responses
///
/// * `200 OK` - Sign-in outcome
/// * `500 Internal Server Error` - Storage or token failure
#[utoipa::path(
    post,
    path = "/api/v1/auth/signin",
    tag = "auth",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Sign-in outcome", body = AuthResult),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn signin_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<SigninRequest>,
) -> Result<impl IntoResponse, AppError> {
    let context = AuditContext::from_headers(&headers);
    let result = state
        .service
        .signin_with_context(&request.username, &request.password, &context)
        .await?;

    Ok(Json(result))
}

/// Claims of the presented token
///
/// # Responses
///
/// * `200 OK` - Authenticated user
/// * `401 Unauthorized` - Missing, invalid or expired token
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Authenticated user", body = AuthenticatedUser),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn me_handler(Extension(user): Extension<AuthenticatedUser>) -> impl IntoResponse {
    Json(user)
}

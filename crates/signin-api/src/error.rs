//! API error handling
//!
//! Author: hephaex@gmail.com

use crate::auth::ServiceError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use signin_core::ErrorCode;
use utoipa::ToSchema;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.as_str().to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn internal_error() -> Self {
        Self::new(ErrorCode::InternalError, "Internal server error")
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    AlreadyExists(String),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ApiError::new(ErrorCode::NotFound, format!("{msg} not found")),
            ),
            AppError::AlreadyExists(msg) => (
                StatusCode::CONFLICT,
                ApiError::new(ErrorCode::AlreadyExists, format!("{msg} already exists")),
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ApiError::new(ErrorCode::BadRequest, msg),
            ),
            AppError::Internal(msg) => {
                // Collaborator details stay in the server log
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, ApiError::internal_error())
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(what) => AppError::NotFound(what),
            ServiceError::AlreadyExists(what) => AppError::AlreadyExists(what),
            ServiceError::Validation(msg) => AppError::BadRequest(msg),
            other => match other.code() {
                ErrorCode::NotFound => AppError::NotFound(other.to_string()),
                ErrorCode::AlreadyExists => AppError::AlreadyExists(other.to_string()),
                _ => AppError::Internal(other.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signin_core::RepositoryError;

    #[test]
    fn test_service_error_mapping() {
        assert!(matches!(
            AppError::from(ServiceError::NotFound("Role 'X'".to_string())),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(ServiceError::Validation("bad".to_string())),
            AppError::BadRequest(_)
        ));
        assert!(matches!(
            AppError::from(ServiceError::Repository(RepositoryError::Conflict(
                "user".to_string()
            ))),
            AppError::AlreadyExists(_)
        ));
        assert!(matches!(
            AppError::from(ServiceError::Repository(RepositoryError::Database(
                "down".to_string()
            ))),
            AppError::Internal(_)
        ));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::NotFound("User 1".to_string()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::AlreadyExists("User 'a'".to_string())
                .into_response()
                .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Internal("boom".to_string()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError::new(ErrorCode::NotFound, "Role 'X' not found").with_details("seed roles first");
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["details"], "seed roles first");
    }
}

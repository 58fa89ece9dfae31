//! Signin API - credential verification and token issuance over HTTP
//!
//! Verifies username/password pairs against stored Argon2id hashes,
//! issues HS256 session tokens, and exposes thin user/role record
//! endpoints guarded by those tokens.

pub mod audit;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::{middleware::from_fn, routing::get, Json, Router};
use state::AppState;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

/// OpenAPI document for the service
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::signin_handler,
        handlers::auth::me_handler,
        handlers::users::list_users_handler,
        handlers::users::create_user_handler,
        handlers::users::update_user_handler,
        handlers::users::delete_user_handler,
        handlers::users::list_roles_handler,
        handlers::health::health_check,
    ),
    components(schemas(
        auth::SigninRequest,
        auth::UserDto,
        auth::AuthenticatedUser,
        signin_core::AuthResult,
        signin_core::User,
        signin_core::Role,
        error::ApiError,
        handlers::health::HealthResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Sign-in and token inspection"),
        (name = "users", description = "User records"),
        (name = "roles", description = "Role records"),
        (name = "health", description = "Liveness"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Build the full application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Fixtures for router-level tests
#[cfg(any(test, feature = "test-utils"))]
pub mod testing {
    use super::*;
    use crate::auth::{JwtConfig, PasswordConfig, TokenIssuer, UserDto, UserService};
    use signin_core::{AppConfig, InMemoryStore};

    pub const ADMIN_USERNAME: &str = "admin";
    pub const ADMIN_PASSWORD: &str = "admin-pass";
    pub const USER_USERNAME: &str = "alice";
    pub const USER_PASSWORD: &str = "secret123";

    /// In-memory state with ADMIN/USER roles, one admin and one regular user
    pub async fn seeded_state() -> Arc<AppState> {
        let config = AppConfig::default();
        let store = Arc::new(InMemoryStore::new());
        let service = UserService::new(
            store.clone(),
            store,
            TokenIssuer::new(JwtConfig::from(&config.token)),
            PasswordConfig::light(),
        );

        service
            .save_roles(&config.seed.roles)
            .await
            .expect("seed roles");
        service
            .create_user(UserDto::new(ADMIN_USERNAME, ADMIN_PASSWORD, "Administrator", "ADMIN"))
            .await
            .expect("seed admin");
        service
            .create_user(UserDto::new(USER_USERNAME, USER_PASSWORD, "Alice", "USER"))
            .await
            .expect("seed user");

        Arc::new(AppState::new(config, service))
    }
}

/// Router over `testing::seeded_state`
#[cfg(any(test, feature = "test-utils"))]
pub async fn create_router_for_testing() -> Router {
    create_router(testing::seeded_state().await)
}

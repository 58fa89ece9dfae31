//! API route definitions
//!
//! Author: hephaex@gmail.com

use crate::auth::middleware::{auth_middleware, require_admin};
use crate::handlers::{auth, users};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

/// Create API v1 routes
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no authentication required)
    let public_routes = Router::new().route("/auth/signin", post(auth::signin_handler));

    // Mutations (ADMIN role required)
    let admin_routes = Router::new()
        .route(
            "/users",
            post(users::create_user_handler).put(users::update_user_handler),
        )
        .route("/users/:id", delete(users::delete_user_handler))
        .route_layer(middleware::from_fn(require_admin));

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route("/users", get(users::list_users_handler))
        .route("/roles", get(users::list_roles_handler))
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}

// src/admin/routes.rs

use axum::{
    routing::{get, patch, post},
    Router,
};

use super::handlers;

pub fn admin_routes() -> Router {
    Router::new()
        .route("/admin/users", get(handlers::list_users))
        .route("/admin/users/create", post(handlers::create_user))
        .route(
            "/admin/users/:id",
            patch(handlers::update_user).delete(handlers::delete_user),
        )
}
